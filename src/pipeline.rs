//! Upload pipeline: orchestrates validation, encoding, the remote write,
//! link generation, history append and user notification.
//!
//! One linear run per file, strictly sequential across a batch; a failure on
//! one file never aborts the rest. Every failure is logged and emitted to the
//! [`EventSink`] exactly once. There are no retries and no concurrent remote
//! writes.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::Rng;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::UploadError;
use crate::history::{HistoryRecord, HistoryStore};
use crate::links::LinkSet;
use crate::media;
use crate::uploader::{NewRemoteFile, RemoteHost};

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 6;

/// An upload candidate on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub path: PathBuf,
    /// Declared media type; the pipeline only accepts `image/*`.
    pub media_type: String,
}

impl LocalFile {
    /// Builds a candidate with the media type inferred from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let media_type = media::media_type_for(&file_name_of(&path)).to_string();
        LocalFile { path, media_type }
    }

    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }
}

fn file_name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Pipeline events for the presentation layer. Progress is purely user
/// feedback at fixed checkpoints; each file gets exactly one terminal event.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    Progress {
        file: String,
        percent: u8,
        stage: &'static str,
    },
    Uploaded {
        file: String,
        record: HistoryRecord,
    },
    Failed {
        file: String,
        message: String,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: UploadEvent);
}

/// Sink that drops every event; handy for tests and headless callers.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: UploadEvent) {}
}

/// Outcome of one file's pipeline run.
#[derive(Debug)]
pub struct FileOutcome {
    pub file: String,
    pub result: Result<HistoryRecord, UploadError>,
}

#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Runs the full pipeline for each file in input order.
///
/// Short-circuits with [`UploadError::ConfigIncomplete`] before any per-file
/// work when the configuration is absent or lacks token/owner; no network
/// call is made and no history is written in that case.
pub async fn upload_batch(
    files: &[LocalFile],
    config: Option<&Config>,
    host: &dyn RemoteHost,
    history: &HistoryStore,
    sink: &dyn EventSink,
) -> Result<BatchReport, UploadError> {
    let config = config
        .filter(|c| c.is_complete())
        .ok_or(UploadError::ConfigIncomplete)?;

    info!(files = files.len(), "starting upload batch");
    let mut outcomes = Vec::with_capacity(files.len());

    for file in files {
        let name = file.file_name();
        match upload_one(file, config, host, history, sink).await {
            Ok(record) => {
                info!(file = %name, remote_path = %record.path, "upload succeeded");
                sink.emit(UploadEvent::Uploaded {
                    file: name.clone(),
                    record: record.clone(),
                });
                outcomes.push(FileOutcome {
                    file: name,
                    result: Ok(record),
                });
            }
            Err(e) => {
                error!(file = %name, error = %e, "upload failed");
                sink.emit(UploadEvent::Failed {
                    file: name.clone(),
                    message: e.to_string(),
                });
                outcomes.push(FileOutcome {
                    file: name,
                    result: Err(e),
                });
            }
        }
    }

    Ok(BatchReport { outcomes })
}

async fn upload_one(
    file: &LocalFile,
    config: &Config,
    host: &dyn RemoteHost,
    history: &HistoryStore,
    sink: &dyn EventSink,
) -> Result<HistoryRecord, UploadError> {
    let original_name = file.file_name();
    let progress = |percent: u8, stage: &'static str| {
        sink.emit(UploadEvent::Progress {
            file: original_name.clone(),
            percent,
            stage,
        });
    };

    progress(0, "preparing upload");
    if !file.media_type.starts_with("image/") {
        return Err(UploadError::UnsupportedType(file.media_type.clone()));
    }

    progress(20, "reading file");
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|e| UploadError::Read {
            path: file.path.display().to_string(),
            source: e,
        })?;
    let content_base64 = BASE64.encode(&bytes);

    let file_name = generated_file_name(&original_name, now_millis());
    let file_path = format!("{}/{}", config.path, file_name);

    progress(40, "uploading to GitHub");
    host.create_file(NewRemoteFile {
        path: file_path.clone(),
        content_base64,
        message: format!("Upload image: {file_name}"),
        branch: config.branch.clone(),
    })
    .await?;

    progress(80, "generating links");
    let links = LinkSet::generate(config, &file_path, &file_name);
    let record = HistoryRecord {
        name: file_name,
        path: file_path,
        links,
        time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    };

    // The file is already on the remote at this point; a history write
    // failure downgrades to a warning rather than failing the upload.
    if let Err(e) = history.append(record.clone()) {
        warn!(error = %e, file = %record.name, "failed to record upload in history");
    }

    progress(100, "upload complete");
    Ok(record)
}

/// `{unix_millis}_{6-char base36 suffix}.{ext}`; the extension is whatever
/// follows the last `.` of the original name (case preserved), `png` when
/// there is none. Unique in practice without asking the remote store.
pub fn generated_file_name(original_name: &str, timestamp_millis: u128) -> String {
    format!(
        "{}_{}.{}",
        timestamp_millis,
        random_suffix(),
        extension_of(original_name)
    )
}

fn extension_of(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext,
        _ => "png",
    }
}

fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
