// In crates/events/src/sink.rs

use crate::{Anomaly, EngineEvent};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Receives the engine's structured events. Formatting is up to the implementor.
pub trait EventSink: Send {
    fn emit(&mut self, event: EngineEvent);
}

/// Writes every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: EngineEvent) {
        match &event {
            EngineEvent::SignalEvaluated(e) => {
                tracing::debug!(time = %e.timestamp, close = %e.close, volatility = ?e.volatility, signal = ?e.signal, "Signal evaluated.");
            }
            EngineEvent::OrderSubmitted(e) => {
                tracing::info!(order_id = %e.order_id, side = %e.side, size = %e.size, price = %e.reference_price, exit_plan = ?e.exit_plan, "Order submitted.");
            }
            EngineEvent::OrderAccepted { order_id } => {
                tracing::info!(%order_id, "Order accepted.");
            }
            EngineEvent::OrderFilled(order) => {
                tracing::info!(order_id = %order.id, side = %order.side, price = ?order.filled_price, commission = ?order.commission, "Order filled.");
            }
            EngineEvent::OrderRejected { order_id, reason } => {
                tracing::warn!(?order_id, %reason, "Order rejected.");
            }
            EngineEvent::OrderCanceled { order_id } => {
                tracing::warn!(%order_id, "Order canceled.");
            }
            EngineEvent::EntrySkipped { timestamp, reason } => {
                tracing::warn!(time = %timestamp, %reason, "Entry signal skipped.");
            }
            EngineEvent::TradeClosed(trade) => {
                tracing::info!(gross = %trade.gross_pnl, net = %trade.net_pnl, entry = %trade.entry_price, exit = %trade.exit_price, "Trade closed.");
            }
            EngineEvent::Anomaly(anomaly) => match anomaly {
                Anomaly::UnknownOrder { order_id, pending } => {
                    tracing::warn!(%order_id, ?pending, "Ignoring notification for an order that is not in flight.");
                }
                Anomaly::InvalidFill { fill, position, reason } => {
                    tracing::warn!(?fill, ?position, %reason, "Ignoring fill that does not match the position.");
                }
                Anomaly::OutOfOrderBar { timestamp, previous } => {
                    tracing::warn!(time = %timestamp, %previous, "Ignoring out-of-order bar.");
                }
            },
            EngineEvent::RunEnded(e) => {
                tracing::info!(
                    volatility_period = e.volatility_period,
                    final_equity = %e.final_equity,
                    final_cash = %e.final_cash,
                    trades = e.trades,
                    net_pnl = %e.net_pnl,
                    halted = e.halted,
                    "Run ended."
                );
            }
        }
    }
}

/// Fans events out to any number of subscribers, e.g. a UI.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<EngineEvent>,
}

impl BroadcastSink {
    pub fn new(tx: broadcast::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for BroadcastSink {
    fn emit(&mut self, event: EngineEvent) {
        // No subscribers is not an error.
        let _ = self.tx.send(event);
    }
}

/// Keeps every event in memory. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<EngineEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn anomalies(&self) -> Vec<Anomaly> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                EngineEvent::Anomaly(a) => Some(a),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: EngineEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
