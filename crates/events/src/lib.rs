// In crates/events/src/lib.rs

// --- Structured Engine Events ---

use chrono::{DateTime, Utc};
use core_types::{ExitPlan, Fill, Order, OrderId, Position, Side, Signal, Trade};
use rust_decimal::Decimal;
use serde::Serialize;

pub mod sink;

pub use sink::{BroadcastSink, EventSink, RecordingSink, TracingSink};

/// Emitted after the signal evaluator has looked at a bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalEvaluated {
    pub timestamp: DateTime<Utc>,
    pub close: Decimal,
    pub volatility: Option<Decimal>,
    pub signal: Signal,
}

/// Emitted once the gateway has acknowledged an order intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSubmitted {
    pub order_id: OrderId,
    pub side: Side,
    pub size: Decimal,
    pub reference_price: Decimal,
    /// Present on entries only.
    pub exit_plan: Option<ExitPlan>,
}

/// Something arrived that does not fit the current order or position state.
/// The engine ignores the input and reports it here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Anomaly {
    /// A notification for an order that is not the one in flight
    /// (late, duplicated or never submitted).
    UnknownOrder {
        order_id: OrderId,
        pending: Option<OrderId>,
    },
    /// A fill that cannot be applied to the current position.
    InvalidFill {
        fill: Fill,
        position: Position,
        reason: String,
    },
    /// A bar whose timestamp does not move time forward.
    OutOfOrderBar {
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },
}

/// The final summary reported when a run stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunEnded {
    pub final_cash: Decimal,
    pub final_equity: Decimal,
    pub bars_processed: u64,
    pub trades: usize,
    pub net_pnl: Decimal,
    pub volatility_period: usize,
    pub halted: bool,
}

/// The top-level observability event.
/// `tag` and `content` are used by serde for clean JSON representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum EngineEvent {
    SignalEvaluated(SignalEvaluated),
    OrderSubmitted(OrderSubmitted),
    OrderAccepted { order_id: OrderId },
    OrderFilled(Order),
    OrderRejected { order_id: Option<OrderId>, reason: String },
    OrderCanceled { order_id: OrderId },
    /// An entry signal that could not be turned into an order.
    EntrySkipped { timestamp: DateTime<Utc>, reason: String },
    TradeClosed(Trade),
    Anomaly(Anomaly),
    RunEnded(RunEnded),
}

impl EngineEvent {
    pub fn is_anomaly(&self) -> bool {
        matches!(self, EngineEvent::Anomaly(_))
    }
}
