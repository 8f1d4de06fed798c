//! The persistence contract: the whole store as one serializable value.
//!
//! The core decides nothing about the storage medium or the save/load
//! cadence; the hosting adapter takes a [`Snapshot`] after mutations and
//! hands one back at startup.

use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::ids::IdGen;
use crate::item::Item;
use crate::store::Collection;
use crate::tag::{Tag, TagAttachment};
use crate::user::{TagOwnership, User};
use crate::Taxonomic;

/// The entire store state in one serializable shape. The id counter is not
/// part of it; [`Taxonomic::restore`] re-derives it from the highest id
/// present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub current_user: Option<User>,
    pub items: Vec<Item>,
    pub tags: Vec<Tag>,
    pub events: Vec<Event>,
    pub tagged_items: Vec<TagAttachment>,
    pub owned_tags: Vec<TagOwnership>,
}

impl Taxonomic {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            users: self.users.to_vec(),
            current_user: self.current_user.clone(),
            items: self.items.to_vec(),
            tags: self.tags.to_vec(),
            events: self.events.to_vec(),
            tagged_items: self.tagged_items.to_vec(),
            owned_tags: self.owned_tags.to_vec(),
        }
    }

    /// Replace the entire store state with the snapshot's.
    pub fn restore(&mut self, snapshot: Snapshot) {
        let Snapshot {
            users,
            current_user,
            items,
            tags,
            events,
            tagged_items,
            owned_tags,
        } = snapshot;
        self.users = Collection::from_rows(users);
        self.items = Collection::from_rows(items);
        self.tags = Collection::from_rows(tags);
        self.events = Collection::from_rows(events);
        self.tagged_items = Collection::from_rows(tagged_items);
        self.owned_tags = Collection::from_rows(owned_tags);
        self.current_user = current_user;

        let mut ids = IdGen::new();
        let highest = [
            self.users.highest_id(),
            self.items.highest_id(),
            self.tags.highest_id(),
            self.events.highest_id(),
            self.tagged_items.highest_id(),
            self.owned_tags.highest_id(),
        ];
        for id in highest.into_iter().flatten() {
            ids.advance_past(id);
        }
        self.ids = ids;
    }
}
