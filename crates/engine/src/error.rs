// In crates/engine/src/error.rs

use core_types::OrderId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Order {pending} is still in flight; refusing to submit another")]
    ConcurrentOrder { pending: OrderId },

    #[error("Gateway refused the order: {0}")]
    Submission(#[from] execution::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] app_config::Error),

    #[error("Indicator setup failed: {0}")]
    Indicator(#[from] strategies::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
