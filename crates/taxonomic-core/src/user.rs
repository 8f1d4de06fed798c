//! User registry: users and the user↔tag ownership relation.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;
use crate::event::Subject;
use crate::ids::{ItemId, RelationId, TagId, UserId};
use crate::store::Record;
use crate::tag::Tag;
use crate::Taxonomic;

/// A known user. Names are not required to be unique; lookups by name
/// return the first match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

impl Record for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        vec![("name", &self.name)]
    }
}

/// Relation row granting a user edit rights over a tag.
/// Unique on `(user_id, tag_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagOwnership {
    pub id: RelationId,
    pub user_id: UserId,
    pub tag_id: TagId,
}

impl Record for TagOwnership {
    type Id = RelationId;

    fn id(&self) -> RelationId {
        self.id
    }
}

impl Taxonomic {
    /// Register a new user. Colliding names are allowed.
    pub fn add_user(&mut self, name: &str) -> User {
        let user = User {
            id: UserId(self.ids.issue()),
            name: name.to_string(),
        };
        self.users.insert(user)
    }

    pub fn users(&self) -> Vec<User> {
        self.users.to_vec()
    }

    pub fn find_user(&self, id: UserId) -> Option<User> {
        self.users.get(id).cloned()
    }

    /// First user with the given name, if any.
    pub fn user_by_name(&self, name: &str) -> Option<User> {
        self.users.iter().find(|user| user.name == name).cloned()
    }

    /// Deduplicated owners of any of the given tags, in first-seen order.
    pub fn users_for_tags(&self, tags: &[TagId]) -> Vec<User> {
        let mut owners: Vec<User> = Vec::new();
        for &tag_id in tags {
            for ownership in self.owned_tags.filter(|o| o.tag_id == tag_id) {
                if owners.iter().all(|owner| owner.id != ownership.user_id) {
                    if let Some(user) = self.users.get(ownership.user_id) {
                        owners.push(user.clone());
                    }
                }
            }
        }
        owners
    }

    /// Users owning any tag attached to the item.
    pub fn users_for_item(&self, item_id: ItemId) -> Vec<User> {
        let tags: Vec<TagId> = self
            .tags_for_item(item_id)
            .into_iter()
            .map(|tag| tag.id)
            .collect();
        self.users_for_tags(&tags)
    }

    /// The subset of the given tags that the user owns.
    pub fn owned_by(&self, user_id: UserId, tags: &[TagId]) -> Vec<Tag> {
        tags.iter()
            .filter(|&&tag_id| {
                !self
                    .owned_tags
                    .filter(|o| o.user_id == user_id && o.tag_id == tag_id)
                    .is_empty()
            })
            .filter_map(|&tag_id| self.tags.get(tag_id).cloned())
            .collect()
    }

    /// Grant the user ownership of the tag. Records an event on both the
    /// user and the tag.
    pub fn become_tag_owner(&mut self, user_id: UserId, tag_id: TagId) -> Result<(), Error> {
        let user = self.require_user(user_id)?;
        let tag = self.require_tag(tag_id)?;

        let row = TagOwnership {
            id: RelationId(self.ids.issue()),
            user_id,
            tag_id,
        };
        if self
            .owned_tags
            .insert_unique(row, "userId, tagId", |o| {
                o.user_id == user_id && o.tag_id == tag_id
            })
            .is_err()
        {
            warn!(user = %user.name, tag = %tag.name, "ownership is already granted");
            return Err(Error::AlreadyOwner {
                user: user.name,
                tag: tag.name,
            });
        }

        let message = format!("{} became owner of {}", user.name, tag.name);
        self.record_event(Subject::User(user_id), &message);
        self.record_event(Subject::Tag(tag_id), &message);
        Ok(())
    }

    /// Remove the user's ownership of the tag. The ownership row is looked
    /// up first; asking to disown a tag the user never owned is reported as
    /// a recoverable error. Nothing stops a tag from reaching zero owners;
    /// that policy belongs to the caller.
    pub fn disown_tag(&mut self, user_id: UserId, tag_id: TagId) -> Result<(), Error> {
        let user = self.require_user(user_id)?;
        let tag = self.require_tag(tag_id)?;

        let row_id = self
            .owned_tags
            .filter(|o| o.user_id == user_id && o.tag_id == tag_id)
            .first()
            .map(|o| o.id);
        let row_id = match row_id {
            Some(id) => id,
            None => {
                warn!(user = %user.name, tag = %tag.name, "no such ownership to disown");
                return Err(Error::OwnershipNotFound {
                    user: user.name,
                    tag: tag.name,
                });
            }
        };
        self.owned_tags.remove(row_id)?;

        let message = format!("{} disowned {}", user.name, tag.name);
        self.record_event(Subject::User(user_id), &message);
        self.record_event(Subject::Tag(tag_id), &message);
        Ok(())
    }

    pub(crate) fn require_user(&self, id: UserId) -> Result<User, Error> {
        match self.users.get(id) {
            Some(user) => Ok(user.clone()),
            None => {
                warn!(%id, "user doesn't exist");
                Err(Error::UserNotFound(id))
            }
        }
    }
}
