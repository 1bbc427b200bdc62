// In crates/risk/src/lib.rs

pub mod error;
pub mod policy;
pub mod sizer;

// Re-export public types
pub use error::{Error, Result};
pub use policy::{LotSizePolicy, SizingPolicy};
pub use sizer::risk_based_size;
