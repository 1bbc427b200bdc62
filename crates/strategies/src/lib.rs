// In crates/strategies/src/lib.rs

use core_types::{Bar, Position, Signal};
pub mod error;
pub mod scalping;
pub mod volatility;

pub use error::{Error, Result};
pub use scalping::{exit_signal, ScalpingEvaluator};
pub use volatility::{Atr, VolatilityEstimator};

/// The universal interface for turning a bar into a trading decision.
///
/// Evaluators are pure: the same bar, volatility and position always produce
/// the same `Signal`. Any rolling state (indicators) lives outside, in the
/// caller, so the evaluator can be tested one bar at a time.
pub trait SignalEvaluator {
    /// The name of the strategy.
    fn name(&self) -> &'static str;

    /// `volatility` is `None` while the indicator is still warming up.
    fn evaluate(&self, bar: &Bar, volatility: Option<Atr>, position: &Position) -> Signal;
}
