//! Identity generation and typed entity identifiers.
//!
//! Every collection in the store draws from one monotonically increasing
//! sequence, so an id is never reused, not even across entity kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }
    };
}

entity_id!(UserId, "Identifier of a `User`.");
entity_id!(ItemId, "Identifier of an `Item`.");
entity_id!(TagId, "Identifier of a `Tag`.");
entity_id!(RelationId, "Identifier of a relation row (attachment or ownership).");
entity_id!(EventId, "Identifier of an audit `Event`.");

/// Issues fresh identifiers. One generator per store.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next raw identifier.
    pub fn issue(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Ensure future ids land strictly above `id`. Used when restoring a
    /// snapshot, since the counter itself is not part of the persisted shape.
    pub fn advance_past(&mut self, id: u64) {
        if id >= self.next {
            self.next = id + 1;
        }
    }
}
