use std::path::PathBuf;
use thiserror::Error;

/// The persistent series store could not be opened, initialised, read or written.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create store directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read schema marker '{0}'")]
    SchemaRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write schema marker '{0}'")]
    SchemaWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to read partition file '{0}'")]
    PartitionRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write partition file '{0}'")]
    PartitionWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode store data from '{0}'")]
    Decode(PathBuf, #[source] Box<bincode::error::DecodeError>),

    #[error("Failed to encode store data")]
    Encode(#[source] Box<bincode::error::EncodeError>),

    #[error("Partition {0} does not exist in this store")]
    UnknownPartition(String),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
