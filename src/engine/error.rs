use crate::store::error::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("The receiving end of the drawing channel was closed.")]
    ChannelClosed,
}
