// In crates/strategies/src/scalping.rs

use crate::SignalEvaluator;
use crate::volatility::Atr;
use app_config::StrategyParams;
use core_types::{Bar, ExitPlan, Position, Signal};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Volatility-breakout scalper.
///
/// - Flat: enter long when the bar closes more than
///   `volatility * entry_threshold_factor` above its open.
/// - Long: exit when the close reaches the stop-loss or take-profit level,
///   both measured from the actual entry price. The stop-loss wins when a
///   single close satisfies both.
#[derive(Debug, Clone)]
pub struct ScalpingEvaluator {
    params: StrategyParams,
}

impl ScalpingEvaluator {
    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }

    /// The price move a bar must exceed (close over open) to trigger an entry.
    pub fn entry_threshold(&self, volatility: Atr) -> Decimal {
        volatility.value() * self.params.entry_threshold_factor()
    }

    /// Stop-loss and take-profit levels for a long entered at `price`.
    pub fn exit_plan(&self, price: Decimal) -> ExitPlan {
        ExitPlan {
            stop_loss: price * (dec!(1) - self.params.stop_loss_factor()),
            take_profit: price * (dec!(1) + self.params.take_profit_factor()),
        }
    }
}

/// Checks a close against exit levels. The stop-loss is checked first, so it
/// wins whenever both levels are satisfied.
pub fn exit_signal(close: Decimal, plan: &ExitPlan) -> Signal {
    if close <= plan.stop_loss {
        Signal::ExitStopLoss
    } else if close >= plan.take_profit {
        Signal::ExitTakeProfit
    } else {
        Signal::Hold
    }
}

impl SignalEvaluator for ScalpingEvaluator {
    fn name(&self) -> &'static str {
        "ScalpingStrategy"
    }

    fn evaluate(&self, bar: &Bar, volatility: Option<Atr>, position: &Position) -> Signal {
        // 1. Nothing is decided while the indicator warms up.
        let Some(volatility) = volatility else {
            return Signal::Hold;
        };

        // 2. Exit checks take precedence once a position is open.
        if position.is_long() {
            return exit_signal(bar.close(), &self.exit_plan(position.entry_price));
        }

        // 3. Breakout entry.
        if volatility.is_exceeded_by(bar.close() - bar.open(), self.params.entry_threshold_factor()) {
            Signal::Enter
        } else {
            Signal::Hold
        }
    }
}
