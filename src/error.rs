use crate::engine::error::EngineError;
use crate::series_data::error::{FetchError, PopulateError};
use crate::store::error::StoreError;
use crate::worker::error::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),

    #[error("The other end of the worker protocol was closed")]
    ChannelClosed,
}

impl From<PopulateError> for ChartError {
    fn from(error: PopulateError) -> Self {
        match error {
            PopulateError::Fetch(e) => ChartError::Fetch(e),
            PopulateError::Store(e) => ChartError::Store(e),
        }
    }
}
