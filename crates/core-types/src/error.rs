// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Malformed bar at {timestamp}: {reason}")]
    InvalidBar { timestamp: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
