use thiserror::Error;

/// Everything that can go wrong while uploading a single file.
///
/// All variants except [`UploadError::ConfigIncomplete`] are scoped to one
/// file: the batch keeps going after reporting them once. `ConfigIncomplete`
/// gates the whole batch before any network traffic happens.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("GitHub token and owner are not configured; run `picbed config set` first")]
    ConfigIncomplete,

    #[error("unsupported file type: {0} (only images are accepted)")]
    UnsupportedType(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("upload rejected: {0}")]
    RemoteRejected(String),

    #[error("network error: {0}")]
    Network(String),
}
