// In crates/execution/src/simulated.rs

use crate::types::{Account, SimulationSettings};
use crate::{Error, ExecutionGateway, Result};
use core_types::{Bar, OrderEvent, OrderId, OrderIntent, OrderNotification, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use tokio::sync::mpsc;

/// An order the simulator has acknowledged but not yet worked.
#[derive(Debug, Clone, Copy)]
struct WorkingOrder {
    id: OrderId,
    intent: OrderIntent,
}

/// A backtest broker.
///
/// Acknowledges market orders immediately and fills them at the open of the
/// next bar it is shown, after slippage, charging `taker_fee` on the traded
/// value. Buys the account cannot pay for and sells larger than the holdings
/// are rejected instead.
pub struct SimulatedGateway {
    settings: SimulationSettings,
    account: Account,
    working: VecDeque<WorkingOrder>,
    next_id: u64,
    notifications: mpsc::UnboundedSender<OrderNotification>,
}

impl SimulatedGateway {
    pub fn new(
        settings: SimulationSettings,
        notifications: mpsc::UnboundedSender<OrderNotification>,
    ) -> Result<Self> {
        settings.validate()?;
        let account = Account::new(settings.initial_cash);
        Ok(Self {
            settings,
            account,
            working: VecDeque::new(),
            next_id: 1,
            notifications,
        })
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn working_orders(&self) -> usize {
        self.working.len()
    }

    fn notify(&self, order_id: OrderId, event: OrderEvent) {
        if self.notifications.send(OrderNotification::new(order_id, event)).is_err() {
            tracing::warn!(%order_id, "Notification receiver dropped; order update lost.");
        }
    }

    /// Works one order against the bar's open.
    fn execute(&mut self, order: WorkingOrder, bar: &Bar) {
        // --- 1. Calculate Execution Price with Slippage ---
        // Slippage always makes the price worse for the taker.
        let slippage = self.settings.slippage_percent;
        let execution_price = match order.intent.side {
            Side::Buy => bar.open() * (dec!(1) + slippage),
            Side::Sell => bar.open() * (dec!(1) - slippage),
        };

        // --- 2. Calculate Costs ---
        let value = order.intent.size * execution_price;
        let commission = value * self.settings.taker_fee;

        // --- 3. Update Account State ---
        match order.intent.side {
            Side::Buy => {
                if self.account.cash < value + commission {
                    self.notify(
                        order.id,
                        OrderEvent::Rejected {
                            reason: format!(
                                "insufficient cash: need {}, have {}",
                                (value + commission).round_dp(2),
                                self.account.cash.round_dp(2)
                            ),
                        },
                    );
                    return;
                }
                self.account.cash -= value + commission;
                self.account.holdings += order.intent.size;
            }
            Side::Sell => {
                if order.intent.size > self.account.holdings {
                    self.notify(
                        order.id,
                        OrderEvent::Rejected {
                            reason: format!(
                                "cannot sell {} units, holding {}",
                                order.intent.size, self.account.holdings
                            ),
                        },
                    );
                    return;
                }
                self.account.cash += value - commission;
                self.account.holdings -= order.intent.size;
            }
        }

        tracing::debug!(order_id = %order.id, side = %order.intent.side, price = %execution_price, %commission, "Simulated fill.");
        self.notify(
            order.id,
            OrderEvent::Filled {
                price: execution_price,
                commission,
            },
        );
    }
}

impl ExecutionGateway for SimulatedGateway {
    fn name(&self) -> &'static str {
        "SimulatedGateway"
    }

    fn submit(&mut self, intent: &OrderIntent) -> Result<OrderId> {
        if intent.size <= Decimal::ZERO {
            return Err(Error::SubmissionFailed {
                reason: format!("order size must be positive, got {}", intent.size),
            });
        }

        let id = OrderId(self.next_id);
        self.next_id += 1;
        self.working.push_back(WorkingOrder { id, intent: *intent });
        self.notify(id, OrderEvent::Accepted);
        Ok(id)
    }

    fn on_market_data(&mut self, bar: &Bar) {
        while let Some(order) = self.working.pop_front() {
            self.execute(order, bar);
        }
        self.account.mark_price = Some(bar.close());
    }

    fn current_cash(&self) -> Decimal {
        self.account.cash
    }

    fn current_equity(&self) -> Decimal {
        self.account.equity()
    }
}
