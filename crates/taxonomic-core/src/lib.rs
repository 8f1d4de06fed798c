//! In-memory relational core of the Taxonomic tagging tool.
//!
//! Users tag catalog items with tags; tags have owners who govern editing
//! rights and can be closed, reopened, or mapped (merged) into one another.
//! All state lives in one owned [`Taxonomic`] value: an entity store, the
//! tag↔item and user↔tag relations, an append-only audit trail, and the
//! single-user session. The hosting application owns persistence (via
//! [`Snapshot`]), seed-data fetching (via [`ItemSeed`]), and all UI.
//!
//! Every operation returns owned copies, so callers can never mutate the
//! store through a returned value. Recoverable rule violations come back as
//! `Err` values; see [`error::Error`] for the two-tier model.

pub mod error;
pub mod event;
pub mod ids;
pub mod item;
pub mod seed;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod tag;
pub mod user;

pub use error::Error;
pub use event::{Event, Subject};
pub use ids::{EventId, IdGen, ItemId, RelationId, TagId, UserId};
pub use item::{Item, ItemFilter, TagMatch};
pub use seed::{parse_item_seeds, ItemSeed};
pub use snapshot::Snapshot;
pub use store::{Collection, Record, SearchHit, StoreError};
pub use tag::{Cotag, Tag, TagAttachment, TagDraft};
pub use user::{TagOwnership, User};

/// The whole store: every collection, the id sequence, and the session.
///
/// Single-writer by construction: all mutation goes through `&mut self`,
/// and nothing inside uses interior mutability or locking.
#[derive(Debug, Clone)]
pub struct Taxonomic {
    pub(crate) ids: IdGen,
    pub(crate) users: Collection<User>,
    pub(crate) items: Collection<Item>,
    pub(crate) tags: Collection<Tag>,
    pub(crate) tagged_items: Collection<TagAttachment>,
    pub(crate) owned_tags: Collection<TagOwnership>,
    pub(crate) events: Collection<Event>,
    pub(crate) current_user: Option<User>,
}

impl Taxonomic {
    /// An empty store: no users, no session, fresh id sequence.
    pub fn new() -> Self {
        Self {
            ids: IdGen::new(),
            users: Collection::new(),
            items: Collection::new(),
            tags: Collection::new(),
            tagged_items: Collection::new(),
            owned_tags: Collection::new(),
            events: Collection::new(),
            current_user: None,
        }
    }

    /// Drop everything, including the audit trail and the id sequence.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Register a roster of users in one call. Convenience for hosts that
    /// seed a default user list after a reset.
    pub fn seed_users(&mut self, names: &[&str]) {
        for name in names {
            self.add_user(name);
        }
    }
}

impl Default for Taxonomic {
    fn default() -> Self {
        Self::new()
    }
}
