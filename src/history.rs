//! Local record of past uploads.
//!
//! A single JSON array under the `history` key, most-recent-first, capped at
//! [`HISTORY_CAP`] entries. The list is read and written wholesale, mirroring
//! how the configuration record is handled.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::links::LinkSet;
use crate::storage::KeyValueStore;

pub const HISTORY_CAP: usize = 50;

const HISTORY_KEY: &str = "history";

/// One completed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Generated file name (timestamp + random suffix + extension).
    pub name: String,
    /// Repository-relative path the file was written to.
    pub path: String,
    pub links: LinkSet,
    /// Human-readable local timestamp.
    pub time: String,
}

pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        HistoryStore { store }
    }

    /// Most-recent-first list of past uploads; empty when nothing persisted.
    /// An unparsable record is logged and treated as empty.
    pub fn load(&self) -> Result<Vec<HistoryRecord>> {
        let Some(raw) = self.store.get(HISTORY_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(error = %e, "stored history is unparsable, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Inserts at the front, evicting the oldest entry past the cap, and
    /// persists the full updated list.
    pub fn append(&self, record: HistoryRecord) -> Result<()> {
        let mut records = self.load()?;
        records.insert(0, record);
        records.truncate(HISTORY_CAP);
        self.store
            .set(HISTORY_KEY, &serde_json::to_string(&records)?)?;
        Ok(())
    }

    /// Deletes all records.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(HISTORY_KEY)?;
        info!("upload history cleared");
        Ok(())
    }
}
