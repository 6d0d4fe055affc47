pub mod context;
pub mod controller;
pub mod error;
pub mod protocol;
pub mod session;
