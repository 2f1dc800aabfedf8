//! Shareable link generation for an uploaded file.
//!
//! Pure and deterministic: the same config, path and file name always yield
//! the same set. The jsDelivr CDN URL is the canonical shareable link and is
//! the one embedded in the markdown/HTML snippets. File names come from the
//! generated safe alphabet, so no escaping is applied here.

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// The five derived strings for a successfully uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSet {
    pub markdown: String,
    pub html: String,
    pub direct: String,
    pub cdn: String,
    pub github: String,
}

impl LinkSet {
    /// `file_path` is repository-relative (`{config.path}/{file_name}`).
    pub fn generate(config: &Config, file_path: &str, file_name: &str) -> LinkSet {
        let direct = format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{}",
            config.owner, config.repo, config.branch, file_path
        );
        let cdn = format!(
            "https://cdn.jsdelivr.net/gh/{}/{}@{}/{}",
            config.owner, config.repo, config.branch, file_path
        );
        let github = format!(
            "https://github.com/{}/{}/blob/{}/{}",
            config.owner, config.repo, config.branch, file_path
        );

        LinkSet {
            markdown: format!("![{file_name}]({cdn})"),
            html: format!("<img src=\"{cdn}\" alt=\"{file_name}\">"),
            direct,
            cdn,
            github,
        }
    }
}
