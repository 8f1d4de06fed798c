//! Append-only audit trail.
//!
//! Every state change in the registries records an [`Event`] against the
//! entity it touched. Events are never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EventId, ItemId, TagId, UserId};
use crate::store::Record;
use crate::user::User;
use crate::Taxonomic;

/// What an event is about. Keeping the kind in the type means the log can
/// never conflate a user id with a tag or item id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    User(UserId),
    Item(ItemId),
    Tag(TagId),
}

/// One entry in the audit trail.
///
/// `creator` is the session's current user at recording time; it is `None`
/// for events recorded while nobody is logged in (the login event itself,
/// for instance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub subject: Subject,
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub creator: Option<User>,
}

impl Record for Event {
    type Id = EventId;

    fn id(&self) -> EventId {
        self.id
    }
}

impl Taxonomic {
    pub(crate) fn record_event(&mut self, subject: Subject, payload: &str) -> Event {
        let event = Event {
            id: EventId(self.ids.issue()),
            subject,
            payload: payload.to_string(),
            created_at: Utc::now(),
            creator: self.current_user.clone(),
        };
        self.events.insert(event)
    }

    /// Every recorded event, newest-last.
    pub fn events(&self) -> Vec<Event> {
        self.events.to_vec()
    }

    /// Events recorded against one subject, newest-last.
    pub fn history_of(&self, subject: Subject) -> Vec<Event> {
        self.events
            .filter(|event| event.subject == subject)
            .into_iter()
            .cloned()
            .collect()
    }
}
