use thiserror::Error;

/// Why a compute request was rejected before any work started.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Unknown dataset selector '{0}'")]
    UnknownDataset(String),

    #[error("Year bound '{0}' is not a number")]
    NotANumber(String),

    #[error("Year range {from}..{to} is reversed")]
    Reversed { from: i32, to: i32 },

    #[error("Year range {from}..{to} lies outside the available {min_year}..{max_year}")]
    OutOfBounds {
        from: i32,
        to: i32,
        min_year: i32,
        max_year: i32,
    },
}
