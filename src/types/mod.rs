pub mod bounds;
pub mod dataset;
pub mod partition;
pub mod record;
