// In crates/app-config/src/types.rs

use crate::{Error, Result};
use execution::SimulationSettings;
use risk::LotSizePolicy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

// --- Raw (as written in the config file) ---

/// Strategy parameters exactly as deserialized. Not usable until validated
/// into a [`StrategyParams`].
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RawStrategyParams {
    /// Number of bars in the volatility (ATR) window.
    pub volatility_period: i64,
    /// Entry triggers when the bar's body exceeds this many ATRs.
    pub entry_threshold_factor: Decimal,
    /// Stop-loss distance as a fraction of entry price (0.01 = 1%).
    pub stop_loss_factor: Decimal,
    /// Take-profit distance as a fraction of entry price.
    pub take_profit_factor: Decimal,
    /// Percent of equity risked per trade (1 = 1%).
    pub risk_per_trade_percent: Decimal,
    /// Emit per-bar trace lines.
    pub debug_logging: bool,
}

impl Default for RawStrategyParams {
    fn default() -> Self {
        Self {
            volatility_period: 20,
            entry_threshold_factor: dec!(1.5),
            stop_loss_factor: dec!(0.01),
            take_profit_factor: dec!(0.02),
            risk_per_trade_percent: dec!(1),
            debug_logging: false,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RawSizingSettings {
    /// Minimum tradeable increment of the instrument.
    pub lot_size: Decimal,
}

impl Default for RawSizingSettings {
    fn default() -> Self {
        Self { lot_size: Decimal::ONE }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RawSettings {
    #[serde(default)]
    pub strategy: RawStrategyParams,
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub sizing: RawSizingSettings,
}

// --- Validated ---

/// Validated, immutable strategy parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyParams {
    volatility_period: usize,
    entry_threshold_factor: Decimal,
    stop_loss_factor: Decimal,
    take_profit_factor: Decimal,
    risk_per_trade_percent: Decimal,
    debug_logging: bool,
}

impl StrategyParams {
    pub fn volatility_period(&self) -> usize {
        self.volatility_period
    }

    pub fn entry_threshold_factor(&self) -> Decimal {
        self.entry_threshold_factor
    }

    pub fn stop_loss_factor(&self) -> Decimal {
        self.stop_loss_factor
    }

    pub fn take_profit_factor(&self) -> Decimal {
        self.take_profit_factor
    }

    pub fn risk_per_trade_percent(&self) -> Decimal {
        self.risk_per_trade_percent
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }
}

impl TryFrom<RawStrategyParams> for StrategyParams {
    type Error = Error;

    fn try_from(raw: RawStrategyParams) -> Result<Self> {
        let volatility_period = usize::try_from(raw.volatility_period)
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| {
                Error::invalid(
                    "strategy.volatility_period",
                    format!("must be a positive integer, got {}", raw.volatility_period),
                )
            })?;

        if raw.entry_threshold_factor < Decimal::ZERO {
            return Err(Error::invalid(
                "strategy.entry_threshold_factor",
                format!("must be >= 0, got {}", raw.entry_threshold_factor),
            ));
        }
        if raw.stop_loss_factor <= Decimal::ZERO || raw.stop_loss_factor >= Decimal::ONE {
            return Err(Error::invalid(
                "strategy.stop_loss_factor",
                format!("must be in (0, 1), got {}", raw.stop_loss_factor),
            ));
        }
        if raw.take_profit_factor <= Decimal::ZERO {
            return Err(Error::invalid(
                "strategy.take_profit_factor",
                format!("must be > 0, got {}", raw.take_profit_factor),
            ));
        }
        if raw.risk_per_trade_percent <= Decimal::ZERO || raw.risk_per_trade_percent > dec!(100) {
            return Err(Error::invalid(
                "strategy.risk_per_trade_percent",
                format!("must be in (0, 100], got {}", raw.risk_per_trade_percent),
            ));
        }

        Ok(Self {
            volatility_period,
            entry_threshold_factor: raw.entry_threshold_factor,
            stop_loss_factor: raw.stop_loss_factor,
            take_profit_factor: raw.take_profit_factor,
            risk_per_trade_percent: raw.risk_per_trade_percent,
            debug_logging: raw.debug_logging,
        })
    }
}

/// The complete, validated application configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    strategy: StrategyParams,
    simulation: SimulationSettings,
    sizing: LotSizePolicy,
}

impl Settings {
    pub fn strategy(&self) -> StrategyParams {
        self.strategy
    }

    pub fn simulation(&self) -> &SimulationSettings {
        &self.simulation
    }

    pub fn sizing(&self) -> LotSizePolicy {
        self.sizing
    }
}

impl TryFrom<RawSettings> for Settings {
    type Error = Error;

    fn try_from(raw: RawSettings) -> Result<Self> {
        let strategy = StrategyParams::try_from(raw.strategy)?;

        raw.simulation
            .validate()
            .map_err(|e| Error::invalid("simulation", e.to_string()))?;

        let sizing = LotSizePolicy::new(raw.sizing.lot_size)
            .map_err(|e| Error::invalid("sizing.lot_size", e.to_string()))?;

        Ok(Self {
            strategy,
            simulation: raw.simulation,
            sizing,
        })
    }
}
