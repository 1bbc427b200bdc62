// In crates/engine/src/order_manager.rs

use crate::position::{FillOutcome, PositionTracker};
use crate::{Error, Result};
use core_types::{Fill, Order, OrderEvent, OrderId, OrderIntent, OrderNotification, OrderStatus};
use events::{Anomaly, EngineEvent};
use execution::ExecutionGateway;

#[derive(Debug, Clone, PartialEq)]
enum OrderState {
    Idle,
    Pending(Order),
}

/// Allows at most one order in flight and walks it to a terminal status.
///
/// Notifications for anything other than the in-flight order are reported as
/// [`Anomaly::UnknownOrder`] and otherwise ignored.
#[derive(Debug, Clone)]
pub struct OrderLifecycleManager {
    state: OrderState,
    last_completed: Option<Order>,
}

impl Default for OrderLifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderLifecycleManager {
    pub fn new() -> Self {
        Self {
            state: OrderState::Idle,
            last_completed: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == OrderState::Idle
    }

    /// The order currently in flight, if any.
    pub fn pending(&self) -> Option<&Order> {
        match &self.state {
            OrderState::Idle => None,
            OrderState::Pending(order) => Some(order),
        }
    }

    /// The most recent order that reached a terminal status.
    pub fn last_completed(&self) -> Option<&Order> {
        self.last_completed.as_ref()
    }

    /// Hands an intent to the gateway. The returned id is the gateway's
    /// acknowledgement; the order is tracked as `Pending` from here on.
    ///
    /// Fails with [`Error::ConcurrentOrder`] if an order is already in flight
    /// and with [`Error::Submission`] if the gateway refuses it. Either way the
    /// state is unchanged.
    pub fn submit(&mut self, intent: OrderIntent, gateway: &mut dyn ExecutionGateway) -> Result<OrderId> {
        if let OrderState::Pending(order) = &self.state {
            return Err(Error::ConcurrentOrder { pending: order.id });
        }

        let id = gateway.submit(&intent)?;
        self.state = OrderState::Pending(Order::submitted(id, &intent));
        Ok(id)
    }

    /// Applies a gateway notification and returns the events it produced.
    /// Fills are forwarded to `positions`.
    pub fn on_notification(
        &mut self,
        notification: OrderNotification,
        positions: &mut PositionTracker,
    ) -> Vec<EngineEvent> {
        let pending_id = self.pending().map(|order| order.id);
        if pending_id != Some(notification.order_id) {
            return vec![EngineEvent::Anomaly(Anomaly::UnknownOrder {
                order_id: notification.order_id,
                pending: pending_id,
            })];
        }

        match notification.event {
            OrderEvent::Accepted => {
                if let OrderState::Pending(order) = &mut self.state {
                    if order.status == OrderStatus::Pending {
                        order.status = OrderStatus::Accepted;
                        return vec![EngineEvent::OrderAccepted { order_id: order.id }];
                    }
                }
                tracing::debug!(order_id = %notification.order_id, "Duplicate acceptance ignored.");
                Vec::new()
            }
            OrderEvent::Filled { price, commission } => {
                let Some(mut order) = self.take_pending() else {
                    return Vec::new();
                };
                order.status = OrderStatus::Filled;
                order.filled_price = Some(price);
                order.commission = Some(commission);

                let fill = Fill {
                    side: order.side,
                    size: order.requested_size,
                    price,
                    commission,
                };

                let mut events = vec![EngineEvent::OrderFilled(order.clone())];
                match positions.apply(&fill) {
                    Ok(FillOutcome::Closed(trade)) => events.push(EngineEvent::TradeClosed(trade)),
                    Ok(FillOutcome::Opened | FillOutcome::PartiallyClosed { .. }) => {}
                    Err(e) => events.push(EngineEvent::Anomaly(Anomaly::InvalidFill {
                        fill,
                        position: *positions.position(),
                        reason: e.reason,
                    })),
                }
                self.last_completed = Some(order);
                events
            }
            OrderEvent::Rejected { reason } => {
                let Some(mut order) = self.take_pending() else {
                    return Vec::new();
                };
                order.status = OrderStatus::Rejected;
                let event = EngineEvent::OrderRejected { order_id: Some(order.id), reason };
                self.last_completed = Some(order);
                vec![event]
            }
            OrderEvent::Canceled => {
                let Some(mut order) = self.take_pending() else {
                    return Vec::new();
                };
                order.status = OrderStatus::Canceled;
                let event = EngineEvent::OrderCanceled { order_id: order.id };
                self.last_completed = Some(order);
                vec![event]
            }
        }
    }

    fn take_pending(&mut self) -> Option<Order> {
        match std::mem::replace(&mut self.state, OrderState::Idle) {
            OrderState::Pending(order) => Some(order),
            OrderState::Idle => None,
        }
    }
}
