// In crates/risk/src/policy.rs

use crate::{Error, Result};
use rust_decimal::Decimal;

/// Rounds a raw position size to something the instrument can actually trade.
pub trait SizingPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the tradeable size, or `Error::InvalidSize` if nothing is left
    /// after rounding.
    fn round(&self, size: Decimal) -> Result<Decimal>;
}

/// Rounds down to a whole multiple of a fixed lot (e.g. 1 share, 100 shares, 0.001 BTC).
#[derive(Debug, Clone, Copy)]
pub struct LotSizePolicy {
    lot_size: Decimal,
}

impl LotSizePolicy {
    pub fn new(lot_size: Decimal) -> Result<Self> {
        if lot_size <= Decimal::ZERO {
            return Err(Error::InvalidParameters(format!("lot size must be positive, got {}", lot_size)));
        }
        Ok(Self { lot_size })
    }

    pub fn lot_size(&self) -> Decimal {
        self.lot_size
    }
}

impl Default for LotSizePolicy {
    fn default() -> Self {
        Self { lot_size: Decimal::ONE }
    }
}

impl SizingPolicy for LotSizePolicy {
    fn name(&self) -> &'static str {
        "LotSizePolicy"
    }

    fn round(&self, size: Decimal) -> Result<Decimal> {
        let lots = (size / self.lot_size).floor();
        let rounded = lots * self.lot_size;
        if rounded <= Decimal::ZERO {
            return Err(Error::InvalidSize { size: rounded });
        }
        Ok(rounded.normalize())
    }
}
