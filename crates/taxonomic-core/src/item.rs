//! Item registry: catalog entries and their tag associations.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;
use crate::event::Subject;
use crate::ids::{ItemId, TagId};
use crate::store::{Record, SearchHit};
use crate::tag::{Tag, TagDraft};
use crate::Taxonomic;

/// A catalog entry. Tags are not stored on the item; they are derived from
/// the attachment relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub content: String,
    pub description: String,
}

impl Record for Item {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("name", &self.name),
            ("content", &self.content),
            ("description", &self.description),
        ]
    }
}

/// Filter for [`Taxonomic::items_matching`]. The `tags` key selects items
/// attached to any of the given tags; `name` is an exact match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemFilter {
    pub name: Option<String>,
    pub tags: Option<Vec<TagId>>,
}

/// An item found through a tag whose name or description matched a search.
#[derive(Debug, Clone, PartialEq)]
pub struct TagMatch {
    pub tag: Tag,
    pub item: Item,
}

impl Taxonomic {
    /// Register a new catalog item.
    pub fn add_item(&mut self, name: &str, content: &str, description: &str) -> Item {
        let item = Item {
            id: ItemId(self.ids.issue()),
            name: name.to_string(),
            content: content.to_string(),
            description: description.to_string(),
        };
        self.items.insert(item)
    }

    pub fn items(&self) -> Vec<Item> {
        self.items.to_vec()
    }

    pub fn items_matching(&self, filter: &ItemFilter) -> Vec<Item> {
        let base = match &filter.tags {
            Some(tags) => self.items_for_tags(tags),
            None => self.items(),
        };
        base.into_iter()
            .filter(|item| filter.name.as_ref().map_or(true, |name| &item.name == name))
            .collect()
    }

    pub fn find_item(&self, id: ItemId) -> Result<Item, Error> {
        self.require_item(id)
    }

    /// Deduplicated items attached to any of the given tags, in
    /// first-seen order.
    pub fn items_for_tags(&self, tags: &[TagId]) -> Vec<Item> {
        let mut items: Vec<Item> = Vec::new();
        for &tag_id in tags {
            for attachment in self.tagged_items.filter(|a| a.tag_id == tag_id) {
                if items.iter().all(|item| item.id != attachment.item_id) {
                    if let Some(item) = self.items.get(attachment.item_id) {
                        items.push(item.clone());
                    }
                }
            }
        }
        items
    }

    /// Items whose name or description contains the query, keyed by the
    /// field that matched.
    pub fn search_items(&self, query: &str) -> Vec<SearchHit<Item>> {
        self.items.search(query, Some(&["name", "description"]))
    }

    /// Items attached to tags whose name or description matches the query,
    /// annotated with the tag that matched.
    pub fn search_items_by_tag(&self, query: &str) -> Vec<TagMatch> {
        let mut matches = Vec::new();
        for hit in self.search_tags(query) {
            for item in self.items_for_tags(&[hit.record.id]) {
                matches.push(TagMatch {
                    tag: hit.record.clone(),
                    item,
                });
            }
        }
        matches
    }

    /// Merge the item's mutable fields onto the stored record and record an
    /// update event. Addressing an unknown id is a consistency error.
    pub fn update_item(&mut self, item: &Item) -> Result<Item, Error> {
        let updated = self.items.update(item.id, |row| {
            row.name = item.name.clone();
            row.content = item.content.clone();
            row.description = item.description.clone();
        })?;
        self.record_event(Subject::Item(updated.id), &format!("Updated {}", updated.name));
        Ok(updated)
    }

    /// Make the item's tag set exactly match `names`: missing tags are
    /// created (which needs a logged-in user), tags absent from the list are
    /// detached, and the rest are attached. Attaching a closed tag is
    /// logged and skipped rather than failing the whole operation.
    pub fn set_tags_by_names(&mut self, item_id: ItemId, names: &[&str]) -> Result<Item, Error> {
        let item = self.require_item(item_id)?;

        let mut new_tags: Vec<Tag> = Vec::new();
        for name in names {
            let tag = match self.tag_by_name(name) {
                Some(tag) => tag,
                None => self.create_tag(TagDraft::named(name))?,
            };
            if new_tags.iter().all(|t| t.id != tag.id) {
                new_tags.push(tag);
            }
        }

        let current = self.tags_for_item(item_id);
        for tag in &current {
            if new_tags.iter().all(|t| t.id != tag.id) {
                self.detach_tag(tag.id, item_id)?;
            }
        }
        for tag in &new_tags {
            if current.iter().all(|t| t.id != tag.id) {
                if self.attach_tag(tag.id, item_id).is_err() {
                    warn!(tag = %tag.name, item = %item.name, "tag was not attached");
                }
            }
        }

        self.require_item(item_id)
    }

    pub(crate) fn require_item(&self, id: ItemId) -> Result<Item, Error> {
        match self.items.get(id) {
            Some(item) => Ok(item.clone()),
            None => {
                warn!(%id, "item not found");
                Err(Error::ItemNotFound(id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logged_in_store() -> Taxonomic {
        let mut tax = Taxonomic::new();
        tax.seed_users(&["Finn"]);
        let finn = tax.user_by_name("Finn").unwrap();
        tax.login(finn.id).unwrap();
        tax
    }

    #[test]
    fn search_keys_results_by_matching_field() {
        let mut tax = logged_in_store();
        tax.add_item("widget", "", "a small part");

        let by_name = tax.search_items("wid");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].field, "name");

        let by_description = tax.search_items("small part");
        assert_eq!(by_description[0].field, "description");
    }

    #[test]
    fn search_ignores_item_content() {
        let mut tax = logged_in_store();
        tax.add_item("widget", "hidden words", "");
        assert!(tax.search_items("hidden").is_empty());
    }

    #[test]
    fn update_item_merges_fields_and_records_event() {
        let mut tax = logged_in_store();
        let mut item = tax.add_item("widget", "", "");
        item.description = "updated description".to_string();

        let updated = tax.update_item(&item).unwrap();
        assert_eq!(updated.description, "updated description");
        assert!(tax
            .history_of(Subject::Item(item.id))
            .iter()
            .any(|e| e.payload == "Updated widget"));
    }

    #[test]
    fn update_item_with_unknown_id_is_a_consistency_error() {
        let mut tax = logged_in_store();
        let ghost = Item {
            id: ItemId(404),
            name: "ghost".into(),
            content: String::new(),
            description: String::new(),
        };
        assert!(matches!(tax.update_item(&ghost), Err(Error::Store(_))));
    }

    #[test]
    fn set_tags_by_names_creates_and_attaches() {
        let mut tax = logged_in_store();
        let item = tax.add_item("widget", "", "");
        tax.set_tags_by_names(item.id, &["red", "metal"]).unwrap();

        let names: Vec<String> = tax
            .tags_for_item(item.id)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["red", "metal"]);
    }

    #[test]
    fn set_tags_by_names_is_idempotent() {
        let mut tax = logged_in_store();
        let item = tax.add_item("widget", "", "");
        tax.set_tags_by_names(item.id, &["red", "metal"]).unwrap();
        let events_after_first = tax.events().len();

        tax.set_tags_by_names(item.id, &["red", "metal"]).unwrap();
        assert_eq!(tax.tags_for_item(item.id).len(), 2);
        // No re-attach, so no new events either.
        assert_eq!(tax.events().len(), events_after_first);
    }

    #[test]
    fn set_tags_by_names_detaches_dropped_names() {
        let mut tax = logged_in_store();
        let item = tax.add_item("widget", "", "");
        tax.set_tags_by_names(item.id, &["red", "metal"]).unwrap();
        tax.set_tags_by_names(item.id, &["metal"]).unwrap();

        let names: Vec<String> = tax
            .tags_for_item(item.id)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["metal"]);
    }

    #[test]
    fn items_matching_resolves_the_tags_key() {
        let mut tax = logged_in_store();
        let tagged = tax.add_item("widget", "", "");
        tax.add_item("gadget", "", "");
        let tag = tax.create_tag(TagDraft::named("red")).unwrap();
        tax.attach_tag(tag.id, tagged.id).unwrap();

        let filter = ItemFilter {
            tags: Some(vec![tag.id]),
            ..ItemFilter::default()
        };
        let found = tax.items_matching(&filter);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, tagged.id);

        // An additional exact-match key narrows further.
        let filter = ItemFilter {
            tags: Some(vec![tag.id]),
            name: Some("gadget".into()),
        };
        assert!(tax.items_matching(&filter).is_empty());
    }

    #[test]
    fn search_by_tag_annotates_the_matching_tag() {
        let mut tax = logged_in_store();
        let item = tax.add_item("widget", "", "");
        let tag = tax.create_tag(TagDraft::named("hardware")).unwrap();
        tax.attach_tag(tag.id, item.id).unwrap();

        let matches = tax.search_items_by_tag("hard");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].tag.id, tag.id);
        assert_eq!(matches[0].item.id, item.id);
    }

    #[test]
    fn items_for_tags_deduplicates_across_tags() {
        let mut tax = logged_in_store();
        let item = tax.add_item("widget", "", "");
        let red = tax.create_tag(TagDraft::named("red")).unwrap();
        let metal = tax.create_tag(TagDraft::named("metal")).unwrap();
        tax.attach_tag(red.id, item.id).unwrap();
        tax.attach_tag(metal.id, item.id).unwrap();

        assert_eq!(tax.items_for_tags(&[red.id, metal.id]).len(), 1);
    }

    #[test]
    fn find_item_reports_missing_ids() {
        let tax = Taxonomic::new();
        assert!(matches!(
            tax.find_item(ItemId(7)),
            Err(Error::ItemNotFound(_))
        ));
    }
}
