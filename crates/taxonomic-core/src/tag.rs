//! Tag registry: lifecycle, attachment, merging, and derived views.
//!
//! A tag is either open or closed. Attaching is only legal while open;
//! closing is only legal once no item carries the tag. The flagged bit is
//! an independent moderation marker with no workflow constraints.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;
use crate::event::{Event, Subject};
use crate::ids::{ItemId, RelationId, TagId};
use crate::store::{Record, SearchHit};
use crate::user::User;
use crate::Taxonomic;

/// A labeled category that can be attached to items.
///
/// `creator` and `created_at` are fixed at creation; updates only merge the
/// name and description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub description: String,
    pub creator: User,
    pub created_at: DateTime<Utc>,
    pub open: bool,
    pub flagged: bool,
}

impl Record for Tag {
    type Id = TagId;

    fn id(&self) -> TagId {
        self.id
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        vec![("name", &self.name), ("description", &self.description)]
    }
}

/// The caller-supplied part of a new tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagDraft {
    pub name: String,
    pub description: String,
}

impl TagDraft {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
        }
    }
}

/// Relation row attaching a tag to an item. Unique on `(tag_id, item_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagAttachment {
    pub id: RelationId,
    pub tag_id: TagId,
    pub item_id: ItemId,
}

impl Record for TagAttachment {
    type Id = RelationId;

    fn id(&self) -> RelationId {
        self.id
    }
}

/// A tag co-occurring with another, and on how many shared items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cotag {
    pub tag: Tag,
    pub count: usize,
}

impl Taxonomic {
    /// Create a tag owned by the current user. The name must be unique
    /// across all tags. On success three events are recorded: the creation
    /// itself plus the pair emitted by the automatic ownership grant.
    pub fn create_tag(&mut self, draft: TagDraft) -> Result<Tag, Error> {
        let creator = match &self.current_user {
            Some(user) => user.clone(),
            None => {
                warn!("can't create a tag without a current user");
                return Err(Error::NotAuthenticated);
            }
        };

        let tag = Tag {
            id: TagId(self.ids.issue()),
            name: draft.name,
            description: draft.description,
            creator: creator.clone(),
            created_at: Utc::now(),
            open: true,
            flagged: false,
        };
        let name = tag.name.clone();
        let tag = match self
            .tags
            .insert_unique(tag, "name", |existing| existing.name == name)
        {
            Ok(tag) => tag,
            Err(_) => {
                warn!(%name, "tag names must be unique");
                return Err(Error::DuplicateTagName(name));
            }
        };

        self.record_event(Subject::Tag(tag.id), &format!("Created new tag {}", tag.name));
        self.become_tag_owner(creator.id, tag.id)?;
        Ok(tag)
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.tags.to_vec()
    }

    pub fn find_tag(&self, id: TagId) -> Option<Tag> {
        self.tags.get(id).cloned()
    }

    pub fn tag_by_name(&self, name: &str) -> Option<Tag> {
        self.tags.iter().find(|tag| tag.name == name).cloned()
    }

    /// Tags attached to the item, in attachment order.
    pub fn tags_for_item(&self, item_id: ItemId) -> Vec<Tag> {
        self.tagged_items
            .filter(|a| a.item_id == item_id)
            .into_iter()
            .filter_map(|a| self.tags.get(a.tag_id).cloned())
            .collect()
    }

    /// Tags whose name or description contains the query, keyed by the
    /// field that matched.
    pub fn search_tags(&self, query: &str) -> Vec<SearchHit<Tag>> {
        self.tags.search(query, Some(&["name", "description"]))
    }

    /// Merge the tag's name and description onto the stored record. The
    /// creator, creation time, open state, and flag are never patched, and a
    /// rename may not collide with another tag's name.
    pub fn update_tag(&mut self, tag: &Tag) -> Result<Tag, Error> {
        if self
            .tags
            .iter()
            .any(|existing| existing.id != tag.id && existing.name == tag.name)
        {
            warn!(name = %tag.name, "tag names must be unique");
            return Err(Error::DuplicateTagName(tag.name.clone()));
        }

        let updated = self.tags.update(tag.id, |row| {
            row.name = tag.name.clone();
            row.description = tag.description.clone();
        })?;
        self.record_event(
            Subject::Tag(updated.id),
            &format!("Updated tag {}", updated.name),
        );
        Ok(updated)
    }

    /// Whether the attachment row exists. Unknown tags or items are
    /// reported as errors rather than `false`.
    pub fn attached(&self, tag_id: TagId, item_id: ItemId) -> Result<bool, Error> {
        self.require_tag(tag_id)?;
        self.require_item(item_id)?;
        Ok(!self
            .tagged_items
            .filter(|a| a.tag_id == tag_id && a.item_id == item_id)
            .is_empty())
    }

    /// Attach an open tag to an item. Records a symmetric event on both.
    pub fn attach_tag(&mut self, tag_id: TagId, item_id: ItemId) -> Result<Tag, Error> {
        let tag = self.require_tag(tag_id)?;
        if !tag.open {
            warn!(tag = %tag.name, "can't attach a tag that is closed");
            return Err(Error::TagClosed(tag.name));
        }
        let item = self.require_item(item_id)?;

        let row = TagAttachment {
            id: RelationId(self.ids.issue()),
            tag_id,
            item_id,
        };
        if self
            .tagged_items
            .insert_unique(row, "tagId, itemId", |a| {
                a.tag_id == tag_id && a.item_id == item_id
            })
            .is_err()
        {
            warn!(tag = %tag.name, item = %item.name, "tag is already attached");
            return Err(Error::AlreadyAttached {
                tag: tag.name,
                item: item.name,
            });
        }

        let message = format!("Attached {} to {}", tag.name, item.name);
        self.record_event(Subject::Tag(tag_id), &message);
        self.record_event(Subject::Item(item_id), &message);
        Ok(tag)
    }

    /// Attach the tag to each item in turn. Per-item failures are logged by
    /// the single form and skipped.
    pub fn attach_tag_many(&mut self, tag_id: TagId, items: &[ItemId]) -> Result<Tag, Error> {
        for &item_id in items {
            let _ = self.attach_tag(tag_id, item_id);
        }
        self.require_tag(tag_id)
    }

    /// Remove the attachment between a tag and an item. Records a symmetric
    /// event on both.
    pub fn detach_tag(&mut self, tag_id: TagId, item_id: ItemId) -> Result<Tag, Error> {
        let tag = self.require_tag(tag_id)?;
        let item = self.require_item(item_id)?;

        let row_id = self
            .tagged_items
            .filter(|a| a.tag_id == tag_id && a.item_id == item_id)
            .first()
            .map(|a| a.id);
        let row_id = match row_id {
            Some(id) => id,
            None => {
                warn!(item = %item.name, tag = %tag.name, "item has no such tag");
                return Err(Error::NotAttached {
                    tag: tag.name,
                    item: item.name,
                });
            }
        };
        self.tagged_items.remove(row_id)?;

        let message = format!("Detached {} from {}", tag.name, item.name);
        self.record_event(Subject::Tag(tag_id), &message);
        self.record_event(Subject::Item(item_id), &message);
        Ok(tag)
    }

    /// Detach the tag from each item in turn. Per-item failures are logged
    /// by the single form and skipped.
    pub fn detach_tag_many(&mut self, tag_id: TagId, items: &[ItemId]) -> Result<Tag, Error> {
        for &item_id in items {
            let _ = self.detach_tag(tag_id, item_id);
        }
        self.require_tag(tag_id)
    }

    /// Open → Closed. Legal only while no item carries the tag.
    pub fn close_tag(&mut self, tag_id: TagId) -> Result<Tag, Error> {
        let tag = self.require_tag(tag_id)?;
        if !tag.open {
            warn!(tag = %tag.name, "can't close a tag that's already closed");
            return Err(Error::AlreadyClosed(tag.name));
        }
        if !self.items_for_tags(&[tag_id]).is_empty() {
            warn!(tag = %tag.name, "can't close a tag still attached to items");
            return Err(Error::TagHasItems(tag.name));
        }

        let updated = self.tags.update(tag_id, |row| row.open = false)?;
        self.record_event(Subject::Tag(tag_id), &format!("Closed {}", updated.name));
        Ok(updated)
    }

    /// Closed → Open.
    pub fn reopen_tag(&mut self, tag_id: TagId) -> Result<Tag, Error> {
        let tag = self.require_tag(tag_id)?;
        if tag.open {
            warn!(tag = %tag.name, "can't open a tag that's already open");
            return Err(Error::AlreadyOpen(tag.name));
        }

        let updated = self.tags.update(tag_id, |row| row.open = true)?;
        self.record_event(Subject::Tag(tag_id), &format!("Reopened {}", updated.name));
        Ok(updated)
    }

    /// Merge the source tags into a destination tag resolved by name (or
    /// created from the draft). Every source tag is detached from all of its
    /// items and the destination is attached to their union. A closed
    /// destination is not guarded here; each attach fails per item, as the
    /// single form does.
    pub fn map_tags(&mut self, sources: &[TagId], draft: TagDraft) -> Result<Tag, Error> {
        let dest = match self.tag_by_name(&draft.name) {
            Some(tag) => tag,
            None => self.create_tag(draft)?,
        };

        let mut source_names: Vec<(TagId, String)> = Vec::new();
        for &source_id in sources {
            source_names.push((source_id, self.require_tag(source_id)?.name));
        }

        let mut moved: Vec<ItemId> = Vec::new();
        for &(source_id, _) in &source_names {
            for item in self.items_for_tags(&[source_id]) {
                self.detach_tag(source_id, item.id)?;
                if !moved.contains(&item.id) {
                    moved.push(item.id);
                }
            }
        }
        self.attach_tag_many(dest.id, &moved)?;

        for (source_id, source_name) in source_names {
            let message = format!("Mapped {} to {}", source_name, dest.name);
            self.record_event(Subject::Tag(source_id), &message);
            self.record_event(Subject::Tag(dest.id), &message);
        }

        self.require_tag(dest.id)
    }

    /// Make the tag's owner set exactly match `names`. Unknown names are
    /// logged and skipped; remaining owners absent from the list are
    /// disowned and new ones granted.
    pub fn set_owners_by_names(&mut self, tag_id: TagId, names: &[&str]) -> Result<Tag, Error> {
        self.require_tag(tag_id)?;

        let mut new_owners: Vec<User> = Vec::new();
        for name in names {
            match self.user_by_name(name) {
                Some(user) => {
                    if new_owners.iter().all(|owner| owner.id != user.id) {
                        new_owners.push(user);
                    }
                }
                None => warn!(%name, "the user doesn't exist so can't own a tag"),
            }
        }

        let current = self.users_for_tags(&[tag_id]);
        for user in &current {
            if new_owners.iter().all(|owner| owner.id != user.id) {
                self.disown_tag(user.id, tag_id)?;
            }
        }
        for user in &new_owners {
            if current.iter().all(|owner| owner.id != user.id) {
                self.become_tag_owner(user.id, tag_id)?;
            }
        }

        self.require_tag(tag_id)
    }

    /// For each other tag sharing at least one item with this tag: how many
    /// of this tag's items it also appears on. Keyed by tag name.
    pub fn cotags(&self, tag_id: TagId) -> Result<BTreeMap<String, Cotag>, Error> {
        self.require_tag(tag_id)?;

        let mut cotags: BTreeMap<String, Cotag> = BTreeMap::new();
        for item in self.items_for_tags(&[tag_id]) {
            for tag in self.tags_for_item(item.id) {
                if tag.id == tag_id {
                    continue;
                }
                cotags
                    .entry(tag.name.clone())
                    .and_modify(|cotag| cotag.count += 1)
                    .or_insert(Cotag { tag, count: 1 });
            }
        }
        Ok(cotags)
    }

    /// Set the moderation flag. Idempotent.
    pub fn flag_tag(&mut self, tag_id: TagId) -> Result<Tag, Error> {
        self.require_tag(tag_id)?;
        Ok(self.tags.update(tag_id, |row| row.flagged = true)?)
    }

    /// Clear the moderation flag. Idempotent.
    pub fn unflag_tag(&mut self, tag_id: TagId) -> Result<Tag, Error> {
        self.require_tag(tag_id)?;
        Ok(self.tags.update(tag_id, |row| row.flagged = false)?)
    }

    pub fn is_flagged(&self, tag_id: TagId) -> Result<bool, Error> {
        Ok(self.require_tag(tag_id)?.flagged)
    }

    /// The tag's audit trail, oldest-first.
    pub fn tag_history(&self, tag_id: TagId) -> Vec<Event> {
        self.history_of(Subject::Tag(tag_id))
    }

    pub(crate) fn require_tag(&self, id: TagId) -> Result<Tag, Error> {
        match self.tags.get(id) {
            Some(tag) => Ok(tag.clone()),
            None => {
                warn!(%id, "tag doesn't exist");
                Err(Error::TagNotFound(id))
            }
        }
    }
}
