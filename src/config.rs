//! Persisted upload target configuration.
//!
//! One whole-record JSON document under the `config` key: GitHub token,
//! repository owner, and the repo/branch/path the images land in. Saves are
//! full overwrites; there is no partial update.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::UploadError;
use crate::storage::KeyValueStore;

pub const DEFAULT_REPO: &str = "weiruan-image";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_PATH: &str = "images";

const CONFIG_KEY: &str = "config";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub path: String,
}

impl Default for Config {
    /// Empty credentials, default repo/branch/path. Not complete until token
    /// and owner are filled in.
    fn default() -> Self {
        Config {
            token: String::new(),
            owner: String::new(),
            repo: DEFAULT_REPO.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            path: DEFAULT_PATH.to_string(),
        }
    }
}

impl Config {
    /// Uploads are only attempted with a token and owner present.
    pub fn is_complete(&self) -> bool {
        !self.token.trim().is_empty() && !self.owner.trim().is_empty()
    }

    /// Trims every field and falls back to defaults for blank repo/branch/path.
    fn normalised(self) -> Config {
        fn or_default(value: &str, default: &str) -> String {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed.to_string()
            }
        }

        Config {
            token: self.token.trim().to_string(),
            owner: self.owner.trim().to_string(),
            repo: or_default(&self.repo, DEFAULT_REPO),
            branch: or_default(&self.branch, DEFAULT_BRANCH),
            path: or_default(&self.path, DEFAULT_PATH),
        }
    }
}

pub struct ConfigStore {
    store: Arc<dyn KeyValueStore>,
}

impl ConfigStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        ConfigStore { store }
    }

    /// Returns the saved configuration, or `None` when nothing was saved yet.
    /// An unparsable record is logged and treated as absent.
    pub fn load(&self) -> Result<Option<Config>> {
        let Some(raw) = self.store.get(CONFIG_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(config) => Ok(Some(config)),
            Err(e) => {
                warn!(error = %e, "stored configuration is unparsable, ignoring it");
                Ok(None)
            }
        }
    }

    /// Validates and persists the full record. Rejects without writing when
    /// token or owner is empty after trimming.
    pub fn save(&self, candidate: Config) -> Result<Config> {
        let config = candidate.normalised();
        if !config.is_complete() {
            return Err(UploadError::ConfigIncomplete.into());
        }
        self.store
            .set(CONFIG_KEY, &serde_json::to_string_pretty(&config)?)?;
        info!(
            owner = %config.owner,
            repo = %config.repo,
            branch = %config.branch,
            path = %config.path,
            "configuration saved"
        );
        Ok(config)
    }
}
