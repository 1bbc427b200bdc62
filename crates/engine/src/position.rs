// In crates/engine/src/position.rs

use core_types::{Fill, Position, Side, Trade};
use rust_decimal::Decimal;
use thiserror::Error;

/// A fill that does not fit the current position. The position is left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid fill: {reason}")]
pub struct InvalidFill {
    pub reason: String,
}

impl InvalidFill {
    fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// What applying a fill did to the position.
#[derive(Debug, Clone, PartialEq)]
pub enum FillOutcome {
    Opened,
    PartiallyClosed { remaining: Decimal },
    Closed(Trade),
}

/// Exit fills collected while a position is being reduced.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ExitLeg {
    size: Decimal,
    notional: Decimal,
    gross_pnl: Decimal,
    commission: Decimal,
}

/// Owns the single long-only position and the ledger of closed trades.
#[derive(Debug, Clone, Default)]
pub struct PositionTracker {
    position: Position,
    exits: ExitLeg,
    trades: Vec<Trade>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Closed trades, oldest first. Entries are never modified once recorded.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn apply(&mut self, fill: &Fill) -> Result<FillOutcome, InvalidFill> {
        if fill.size <= Decimal::ZERO {
            return Err(InvalidFill::new(format!("fill size must be positive, got {}", fill.size)));
        }

        match (fill.side, self.position.is_flat()) {
            (Side::Buy, true) => {
                self.position = Position {
                    size: fill.size,
                    entry_price: fill.price,
                    entry_commission: fill.commission,
                };
                self.exits = ExitLeg::default();
                Ok(FillOutcome::Opened)
            }
            (Side::Buy, false) => Err(InvalidFill::new("buy fill while already long")),
            (Side::Sell, true) => Err(InvalidFill::new("sell fill while flat")),
            (Side::Sell, false) => self.reduce(fill),
        }
    }

    fn reduce(&mut self, fill: &Fill) -> Result<FillOutcome, InvalidFill> {
        if fill.size > self.position.size {
            return Err(InvalidFill::new(format!(
                "sell of {} exceeds position of {}",
                fill.size, self.position.size
            )));
        }

        self.exits.size += fill.size;
        self.exits.notional += fill.price * fill.size;
        self.exits.gross_pnl += (fill.price - self.position.entry_price) * fill.size;
        self.exits.commission += fill.commission;

        let remaining = self.position.size - fill.size;
        if !remaining.is_zero() {
            self.position.size = remaining;
            return Ok(FillOutcome::PartiallyClosed { remaining });
        }

        let exits = std::mem::take(&mut self.exits);
        let gross_pnl = exits.gross_pnl;
        let trade = Trade {
            entry_price: self.position.entry_price,
            exit_price: exits.notional / exits.size,
            size: exits.size,
            gross_pnl,
            net_pnl: gross_pnl - self.position.entry_commission - exits.commission,
        };
        self.position = Position::flat();
        self.trades.push(trade);
        Ok(FillOutcome::Closed(trade))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn fill(side: Side, size: Decimal, price: Decimal, commission: Decimal) -> Fill {
        Fill { side, size, price, commission }
    }

    #[test]
    fn buy_while_flat_opens_long() {
        let mut tracker = PositionTracker::new();
        let outcome = tracker.apply(&fill(Side::Buy, dec!(10), dec!(100), dec!(1))).unwrap();
        assert_eq!(outcome, FillOutcome::Opened);
        assert_eq!(
            *tracker.position(),
            Position { size: dec!(10), entry_price: dec!(100), entry_commission: dec!(1) }
        );
    }

    #[test]
    fn full_sell_closes_with_pnl() {
        let mut tracker = PositionTracker::new();
        tracker.apply(&fill(Side::Buy, dec!(10), dec!(100), dec!(1))).unwrap();
        let outcome = tracker.apply(&fill(Side::Sell, dec!(10), dec!(102), dec!(1.5))).unwrap();

        let expected = Trade {
            entry_price: dec!(100),
            exit_price: dec!(102),
            size: dec!(10),
            gross_pnl: dec!(20),
            net_pnl: dec!(17.5),
        };
        assert_eq!(outcome, FillOutcome::Closed(expected));
        assert!(tracker.position().is_flat());
        assert_eq!(tracker.trades(), &[expected]);
    }

    #[test]
    fn losing_trade_has_negative_pnl() {
        let mut tracker = PositionTracker::new();
        tracker.apply(&fill(Side::Buy, dec!(5), dec!(100), dec!(0))).unwrap();
        let FillOutcome::Closed(trade) = tracker.apply(&fill(Side::Sell, dec!(5), dec!(99), dec!(0.5))).unwrap() else {
            panic!("expected a closed trade");
        };
        assert_eq!(trade.gross_pnl, dec!(-5));
        assert_eq!(trade.net_pnl, dec!(-5.5));
    }

    #[test]
    fn partial_sell_reduces_without_trade() {
        let mut tracker = PositionTracker::new();
        tracker.apply(&fill(Side::Buy, dec!(10), dec!(100), dec!(1))).unwrap();
        let outcome = tracker.apply(&fill(Side::Sell, dec!(4), dec!(105), dec!(0.4))).unwrap();

        assert_eq!(outcome, FillOutcome::PartiallyClosed { remaining: dec!(6) });
        assert_eq!(tracker.position().size, dec!(6));
        assert_eq!(tracker.position().entry_price, dec!(100));
        assert!(tracker.trades().is_empty());
    }

    #[test]
    fn partial_exits_fold_into_final_trade() {
        let mut tracker = PositionTracker::new();
        tracker.apply(&fill(Side::Buy, dec!(10), dec!(100), dec!(1))).unwrap();
        tracker.apply(&fill(Side::Sell, dec!(4), dec!(105), dec!(0.4))).unwrap();
        let FillOutcome::Closed(trade) = tracker.apply(&fill(Side::Sell, dec!(6), dec!(110), dec!(0.6))).unwrap() else {
            panic!("expected a closed trade");
        };

        // 4 * 5 + 6 * 10
        assert_eq!(trade.gross_pnl, dec!(80));
        assert_eq!(trade.net_pnl, dec!(78));
        assert_eq!(trade.exit_price, dec!(108));
        assert_eq!(trade.size, dec!(10));
    }

    #[test]
    fn invalid_combinations_leave_state_untouched() {
        let mut tracker = PositionTracker::new();
        assert!(tracker.apply(&fill(Side::Sell, dec!(1), dec!(100), dec!(0))).is_err());
        assert!(tracker.position().is_flat());

        tracker.apply(&fill(Side::Buy, dec!(10), dec!(100), dec!(0))).unwrap();
        let before = *tracker.position();
        assert!(tracker.apply(&fill(Side::Buy, dec!(1), dec!(101), dec!(0))).is_err());
        assert!(tracker.apply(&fill(Side::Sell, dec!(11), dec!(101), dec!(0))).is_err());
        assert!(tracker.apply(&fill(Side::Sell, dec!(0), dec!(101), dec!(0))).is_err());
        assert_eq!(*tracker.position(), before);
        assert!(tracker.trades().is_empty());
    }

    proptest! {
        /// Size never goes negative, and a trade appears exactly when a long
        /// position is brought back to zero.
        #[test]
        fn trade_iff_position_returns_to_zero(
            ops in proptest::collection::vec((any::<bool>(), 1u32..20, 50u32..150), 1..60)
        ) {
            let mut tracker = PositionTracker::new();
            for (is_buy, size, price) in ops {
                let side = if is_buy { Side::Buy } else { Side::Sell };
                let before = *tracker.position();
                let trades_before = tracker.trades().len();

                let result = tracker.apply(&fill(side, Decimal::from(size), Decimal::from(price), dec!(0.1)));

                let after = *tracker.position();
                prop_assert!(after.size >= Decimal::ZERO);
                let closed = before.size > Decimal::ZERO && after.size.is_zero();
                prop_assert_eq!(tracker.trades().len() - trades_before, usize::from(closed));
                if result.is_err() {
                    prop_assert_eq!(after, before);
                }
            }
        }
    }
}
