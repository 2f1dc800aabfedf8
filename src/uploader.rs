//! Remote host abstraction and the GitHub contents API client.
//!
//! The trait is the seam the pipeline uploads through; tests replace it with
//! the generated mock. The real implementation issues a single authenticated
//! create-or-overwrite PUT per file, with no retries.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::UploadError;

pub const GITHUB_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("picbed/", env!("CARGO_PKG_VERSION"));

/// One file to create in the remote repository.
#[derive(Debug, Clone)]
pub struct NewRemoteFile {
    /// Repository-relative target path.
    pub path: String,
    /// Base64-encoded file content.
    pub content_base64: String,
    /// Commit message for the write.
    pub message: String,
    /// Target branch.
    pub branch: String,
}

/// A host that can persist one file per call. Implemented by [`GitHubHost`]
/// and by test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteHost: Send + Sync {
    async fn create_file(&self, req: NewRemoteFile) -> Result<(), UploadError>;
}

#[derive(Serialize)]
struct CreateFileBody<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// GitHub contents API client.
pub struct GitHubHost {
    http: reqwest::Client,
    api_base: String,
    token: String,
    owner: String,
    repo: String,
}

impl GitHubHost {
    pub fn new(config: &Config) -> Self {
        Self::with_api_base(config, GITHUB_API_BASE)
    }

    /// `api_base` is injectable so tests can point at a local server.
    pub fn with_api_base(config: &Config, api_base: impl Into<String>) -> Self {
        GitHubHost {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: config.token.clone(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
        }
    }
}

#[async_trait]
impl RemoteHost for GitHubHost {
    async fn create_file(&self, req: NewRemoteFile) -> Result<(), UploadError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.owner, self.repo, req.path
        );
        debug!(url = %url, branch = %req.branch, "issuing contents API write");

        let response = self
            .http
            .put(&url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", USER_AGENT)
            .json(&CreateFileBody {
                message: &req.message,
                content: &req.content_base64,
                branch: &req.branch,
            })
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(path = %req.path, "contents API write accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(UploadError::RemoteRejected(rejection_message(status, &body)))
    }
}

/// Prefers the `message` field of the response body, as GitHub reports errors
/// there ("Bad credentials", "Not Found", ...); falls back to the status code.
fn rejection_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody { message: Some(m) }) if !m.is_empty() => m,
        _ => format!("upload failed with status {status}"),
    }
}
