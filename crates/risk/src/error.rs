// In crates/risk/src/error.rs

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Position size {size} is not tradeable")]
    InvalidSize { size: Decimal },

    #[error("Invalid risk parameters: {0}")]
    InvalidParameters(String),
}

pub type Result<T> = std::result::Result<T, Error>;
