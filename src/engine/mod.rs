pub mod aggregation;
pub mod axis;
pub mod error;
pub mod unit;
