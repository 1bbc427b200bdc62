// In crates/core-types/src/types.rs

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// --- Market Data ---

/// A single OHLC bar of market data.
///
/// Bars are immutable once built. `Bar::new` refuses malformed input, so every
/// `Bar` in the system satisfies `low <= open, close <= high` with no negative prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bar {
    timestamp: DateTime<Utc>,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidBar {
            timestamp: timestamp.to_rfc3339(),
            reason: reason.to_string(),
        };

        if open.is_sign_negative() || high.is_sign_negative() || low.is_sign_negative() || close.is_sign_negative() {
            return Err(invalid("prices must not be negative"));
        }
        if low > high {
            return Err(invalid("low is above high"));
        }
        if open < low || open > high {
            return Err(invalid("open is outside the high/low range"));
        }
        if close < low || close > high {
            return Err(invalid("close is outside the high/low range"));
        }

        Ok(Self { timestamp, open, high, low, close })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn open(&self) -> Decimal {
        self.open
    }

    pub fn high(&self) -> Decimal {
        self.high
    }

    pub fn low(&self) -> Decimal {
        self.low
    }

    pub fn close(&self) -> Decimal {
        self.close
    }
}

// --- Signals ---

/// The decision produced by evaluating one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// No action on this bar.
    Hold,
    /// Open a long position.
    Enter,
    /// Close the long position: price fell to the stop-loss level.
    ExitStopLoss,
    /// Close the long position: price reached the take-profit level.
    ExitTakeProfit,
}

// --- Orders ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Identifier assigned to an order by the execution gateway on submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the engine wants the gateway to do. Always a market order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub side: Side,
    pub size: Decimal,
    /// The price the decision was made at (the close of the deciding bar).
    pub reference_price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Accepted,
    Filled,
    Rejected,
    Canceled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Rejected | OrderStatus::Canceled)
    }
}

/// An order tracked by the engine from submission to a terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub requested_size: Decimal,
    pub status: OrderStatus,
    pub submitted_price: Decimal,
    pub filled_price: Option<Decimal>,
    pub commission: Option<Decimal>,
}

impl Order {
    /// A freshly acknowledged order, in `Pending` status.
    pub fn submitted(id: OrderId, intent: &OrderIntent) -> Self {
        Self {
            id,
            side: intent.side,
            requested_size: intent.size,
            status: OrderStatus::Pending,
            submitted_price: intent.reference_price,
            filled_price: None,
            commission: None,
        }
    }
}

/// A status change reported by the execution gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum OrderEvent {
    Accepted,
    Filled { price: Decimal, commission: Decimal },
    Rejected { reason: String },
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNotification {
    pub order_id: OrderId,
    pub event: OrderEvent,
}

impl OrderNotification {
    pub fn new(order_id: OrderId, event: OrderEvent) -> Self {
        Self { order_id, event }
    }
}

/// Execution details of a filled order, as applied to the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Fill {
    pub side: Side,
    pub size: Decimal,
    pub price: Decimal,
    pub commission: Decimal,
}

// --- Positions and Trades ---

/// The single long-only position. `size == 0` means flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub size: Decimal,
    pub entry_price: Decimal,
    pub entry_commission: Decimal,
}

impl Position {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.size.is_zero()
    }

    pub fn is_long(&self) -> bool {
        self.size > Decimal::ZERO
    }
}

/// A completed round trip, recorded once when the position returns to flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Trade {
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub size: Decimal,
    pub gross_pnl: Decimal,
    pub net_pnl: Decimal,
}

/// Stop-loss and take-profit levels recorded when an entry is submitted.
///
/// These are monitored locally bar by bar; no bracket order is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExitPlan {
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap()
    }

    #[test]
    fn bar_accepts_consistent_prices() {
        let bar = Bar::new(ts(), dec!(10), dec!(12), dec!(9), dec!(11)).unwrap();
        assert_eq!(bar.close(), dec!(11));
        assert_eq!(bar.timestamp(), ts());
    }

    #[test]
    fn bar_rejects_inverted_range() {
        let err = Bar::new(ts(), dec!(10), dec!(9), dec!(12), dec!(10)).unwrap_err();
        assert!(matches!(err, Error::InvalidBar { .. }));
    }

    #[test]
    fn bar_rejects_close_outside_range() {
        assert!(Bar::new(ts(), dec!(10), dec!(12), dec!(9), dec!(13)).is_err());
        assert!(Bar::new(ts(), dec!(8), dec!(12), dec!(9), dec!(10)).is_err());
    }

    #[test]
    fn bar_rejects_negative_prices() {
        assert!(Bar::new(ts(), dec!(-1), dec!(1), dec!(-2), dec!(0)).is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Accepted.is_terminal());
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
    }

    #[test]
    fn submitted_order_starts_pending() {
        let intent = OrderIntent { side: Side::Buy, size: dec!(5), reference_price: dec!(100) };
        let order = Order::submitted(OrderId(7), &intent);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.requested_size, dec!(5));
        assert_eq!(order.submitted_price, dec!(100));
        assert!(order.filled_price.is_none());
    }

    #[test]
    fn flat_position() {
        let pos = Position::flat();
        assert!(pos.is_flat());
        assert!(!pos.is_long());
    }
}
