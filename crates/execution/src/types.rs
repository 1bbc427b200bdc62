// In crates/execution/src/types.rs

use crate::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SimulationSettings {
    /// Starting cash balance of the simulated account.
    #[serde(default = "default_initial_cash")]
    pub initial_cash: Decimal,

    /// Commission charged on every fill, as a fraction of traded value (e.g., 0.0004 for 0.04%).
    #[serde(default)]
    pub taker_fee: Decimal,

    /// The simulated slippage for market orders, as a fraction of price (e.g., 0.0005 for 0.05%).
    #[serde(default)]
    pub slippage_percent: Decimal,
}

fn default_initial_cash() -> Decimal {
    dec!(10_000)
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            initial_cash: default_initial_cash(),
            taker_fee: Decimal::ZERO,
            slippage_percent: Decimal::ZERO,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> Result<()> {
        if self.initial_cash <= Decimal::ZERO {
            return Err(Error::InvalidSettings(format!(
                "initial_cash must be positive, got {}",
                self.initial_cash
            )));
        }
        if self.taker_fee < Decimal::ZERO {
            return Err(Error::InvalidSettings(format!(
                "taker_fee must not be negative, got {}",
                self.taker_fee
            )));
        }
        if self.slippage_percent < Decimal::ZERO || self.slippage_percent >= Decimal::ONE {
            return Err(Error::InvalidSettings(format!(
                "slippage_percent must be in [0, 1), got {}",
                self.slippage_percent
            )));
        }
        Ok(())
    }
}

/// Represents the state of the simulated trading account.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The free cash balance.
    pub cash: Decimal,

    /// Units currently held (long only).
    pub holdings: Decimal,

    /// The last close seen, used to mark holdings.
    pub mark_price: Option<Decimal>,
}

impl Account {
    /// Creates a new account with an initial cash balance.
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            cash: initial_cash,
            holdings: Decimal::ZERO,
            mark_price: None,
        }
    }

    pub fn equity(&self) -> Decimal {
        match self.mark_price {
            Some(price) => self.cash + self.holdings * price,
            None => self.cash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        assert!(SimulationSettings::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_settings() {
        let mut s = SimulationSettings::default();
        s.initial_cash = dec!(0);
        assert!(s.validate().is_err());

        let mut s = SimulationSettings::default();
        s.taker_fee = dec!(-0.001);
        assert!(s.validate().is_err());

        let mut s = SimulationSettings::default();
        s.slippage_percent = dec!(1);
        assert!(s.validate().is_err());
    }

    #[test]
    fn equity_marks_holdings() {
        let mut account = Account::new(dec!(1000));
        assert_eq!(account.equity(), dec!(1000));
        account.cash = dec!(500);
        account.holdings = dec!(5);
        account.mark_price = Some(dec!(110));
        assert_eq!(account.equity(), dec!(1050));
    }
}
