//! The seed-data contract: replacing the item catalog from descriptors
//! fetched by the host.
//!
//! The fetch itself is the host's business; the core receives the decoded
//! descriptors and performs an all-or-nothing replace of the item catalog.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;
use crate::Taxonomic;

/// One item descriptor from the seed resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemSeed {
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Decode a fetched seed document (a JSON array of descriptors).
pub fn parse_item_seeds(json: &str) -> Result<Vec<ItemSeed>, serde_json::Error> {
    serde_json::from_str(json)
}

impl Taxonomic {
    /// Replace the item catalog: clear items and tag attachments, then
    /// recreate one item per seed and resolve/create+attach its named tags.
    ///
    /// A user must be logged in (tag creation needs one); that is checked
    /// before anything is cleared. If a later step fails anyway, the store
    /// is left partially repopulated; the replace is not transactional.
    pub fn load_items(&mut self, seeds: Vec<ItemSeed>) -> Result<(), Error> {
        if self.current_user.is_none() {
            warn!("can't load items without a current user");
            return Err(Error::NotAuthenticated);
        }

        self.items.clear();
        self.tagged_items.clear();

        for seed in seeds {
            let item = self.add_item(&seed.name, &seed.content, &seed.description);
            let names: Vec<&str> = seed.tags.iter().map(String::as_str).collect();
            self.set_tags_by_names(item.id, &names)?;
        }
        Ok(())
    }
}
