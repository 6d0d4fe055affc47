use crate::store::error::StoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    // Covers errors during download stream processing and decompression
    #[error("Data download or decompression failed")]
    DownloadIo(#[from] std::io::Error),

    #[error("Failed to read source file '{0}'")]
    SourceFileRead(PathBuf, #[source] std::io::Error),

    #[error("Source file not found at '{plain}' nor at '{compressed}'")]
    SourceFileMissing { plain: PathBuf, compressed: PathBuf },

    #[error("Failed to parse JSON data for {0}")]
    JsonParse(String, #[source] serde_json::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Failure of a fetch-and-populate pass: either the source or the store gave out.
#[derive(Debug, Error)]
pub enum PopulateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
