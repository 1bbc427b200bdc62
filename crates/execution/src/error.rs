// In crates/execution/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Order submission failed: {reason}")]
    SubmissionFailed { reason: String },

    #[error("Invalid simulation settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T> = std::result::Result<T, Error>;
