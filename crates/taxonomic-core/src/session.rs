//! Session: the single authenticated actor and the permissions derived
//! from tag ownership.

use tracing::warn;

use crate::error::Error;
use crate::event::Subject;
use crate::ids::{ItemId, TagId, UserId};
use crate::user::User;
use crate::Taxonomic;

impl Taxonomic {
    /// The authenticated user, if any. A copy, decoupled from the registry.
    pub fn current_user(&self) -> Option<User> {
        self.current_user.clone()
    }

    /// Authenticate as a registered user. The login event is recorded
    /// before the session changes hands, so its `creator` reflects whoever
    /// (if anyone) was logged in at the time.
    pub fn login(&mut self, user_id: UserId) -> Result<User, Error> {
        let user = self.require_user(user_id)?;
        self.record_event(Subject::User(user.id), &format!("Logged {} in", user.name));
        self.current_user = Some(user.clone());
        Ok(user)
    }

    /// Clear the session, recording a logout event for the departing user.
    pub fn logout(&mut self) -> Result<(), Error> {
        let user = match self.current_user.clone() {
            Some(user) => user,
            None => {
                warn!("no current user to log out");
                return Err(Error::NotAuthenticated);
            }
        };
        self.record_event(Subject::User(user.id), &format!("Logged {} out", user.name));
        self.current_user = None;
        Ok(())
    }

    /// Whether the current user owns the tag. `false` when logged out.
    pub fn can_edit_tag(&self, tag_id: TagId) -> bool {
        match &self.current_user {
            Some(user) => !self.owned_by(user.id, &[tag_id]).is_empty(),
            None => false,
        }
    }

    /// Whether the current user owns at least one tag attached to the item.
    pub fn can_edit_item(&self, item_id: ItemId) -> bool {
        match &self.current_user {
            Some(user) => {
                let tags: Vec<TagId> = self
                    .tags_for_item(item_id)
                    .into_iter()
                    .map(|tag| tag.id)
                    .collect();
                !self.owned_by(user.id, &tags).is_empty()
            }
            None => false,
        }
    }
}
