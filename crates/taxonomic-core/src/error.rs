//! Two-tier error model.
//!
//! Recoverable domain errors (bad input, rule violations, not-found,
//! not-authenticated) are returned as plain `Err` values after a
//! `tracing::warn!`; the caller is expected to branch on them. The
//! `Store` variant wraps consistency failures from the collection layer
//! (an update or removal addressed at a record that does not exist), which
//! indicate a bug in the calling code rather than a reachable user scenario.

use crate::ids::{ItemId, TagId, UserId};
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no user is logged in")]
    NotAuthenticated,

    #[error("user {0} doesn't exist")]
    UserNotFound(UserId),

    #[error("item {0} doesn't exist")]
    ItemNotFound(ItemId),

    #[error("tag {0} doesn't exist")]
    TagNotFound(TagId),

    #[error("a tag named '{0}' already exists")]
    DuplicateTagName(String),

    #[error("tag '{tag}' is already attached to '{item}'")]
    AlreadyAttached { tag: String, item: String },

    #[error("'{item}' has no tag '{tag}'")]
    NotAttached { tag: String, item: String },

    #[error("'{user}' already owns '{tag}'")]
    AlreadyOwner { user: String, tag: String },

    #[error("'{user}' doesn't own '{tag}'")]
    OwnershipNotFound { user: String, tag: String },

    #[error("tag '{0}' is closed")]
    TagClosed(String),

    #[error("tag '{0}' is already closed")]
    AlreadyClosed(String),

    #[error("tag '{0}' is already open")]
    AlreadyOpen(String),

    #[error("tag '{0}' is still attached to items")]
    TagHasItems(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
