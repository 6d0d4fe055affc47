pub mod error;
pub mod registry;
pub mod series_store;
