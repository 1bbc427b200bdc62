// In crates/engine/src/strategy_engine.rs

use crate::order_manager::OrderLifecycleManager;
use crate::position::PositionTracker;
use crate::report::RunReport;
use crate::{Error, Result};
use app_config::StrategyParams;
use chrono::{DateTime, Utc};
use core_types::{Bar, ExitPlan, Order, OrderIntent, OrderNotification, Position, Side, Signal, Trade};
use events::{Anomaly, EngineEvent, EventSink, OrderSubmitted, RunEnded, SignalEvaluated};
use execution::ExecutionGateway;
use risk::{SizingPolicy, risk_based_size};
use rust_decimal::Decimal;
use strategies::{Atr, ScalpingEvaluator, SignalEvaluator, VolatilityEstimator};
use ta::Next;

/// Runs the scalping strategy for one instrument.
///
/// Every input (a bar or an order notification) is handled to completion
/// before the next one; the engine itself never waits on anything. The
/// [`crate::Runner`] is responsible for feeding it in order.
pub struct StrategyEngine {
    params: StrategyParams,
    volatility: VolatilityEstimator,
    evaluator: ScalpingEvaluator,
    sizing: Box<dyn SizingPolicy>,
    gateway: Box<dyn ExecutionGateway>,
    sink: Box<dyn EventSink>,
    orders: OrderLifecycleManager,
    positions: PositionTracker,
    exit_plan: Option<ExitPlan>,
    last_timestamp: Option<DateTime<Utc>>,
    bars_processed: u64,
    orders_submitted: u64,
}

impl StrategyEngine {
    pub fn new(
        params: StrategyParams,
        sizing: Box<dyn SizingPolicy>,
        gateway: Box<dyn ExecutionGateway>,
        sink: Box<dyn EventSink>,
    ) -> Result<Self> {
        let volatility = VolatilityEstimator::new(params.volatility_period())?;
        let evaluator = ScalpingEvaluator::new(params);

        tracing::info!(
            strategy = evaluator.name(),
            gateway = gateway.name(),
            sizing = sizing.name(),
            "Strategy initialized."
        );
        tracing::info!(
            volatility_period = params.volatility_period(),
            entry_factor = %params.entry_threshold_factor(),
            stop_loss = %params.stop_loss_factor(),
            take_profit = %params.take_profit_factor(),
            risk_percent = %params.risk_per_trade_percent(),
            "Strategy parameters."
        );

        Ok(Self {
            params,
            volatility,
            evaluator,
            sizing,
            gateway,
            sink,
            orders: OrderLifecycleManager::new(),
            positions: PositionTracker::new(),
            exit_plan: None,
            last_timestamp: None,
            bars_processed: 0,
            orders_submitted: 0,
        })
    }

    // --- Read-only state ---

    pub fn position(&self) -> &Position {
        self.positions.position()
    }

    pub fn trades(&self) -> &[Trade] {
        self.positions.trades()
    }

    pub fn pending_order(&self) -> Option<&Order> {
        self.orders.pending()
    }

    /// Levels being watched for the open (or opening) position.
    pub fn exit_plan(&self) -> Option<ExitPlan> {
        self.exit_plan
    }

    pub fn volatility(&self) -> Option<Decimal> {
        self.volatility.estimate().map(|atr| atr.value())
    }

    pub fn bars_processed(&self) -> u64 {
        self.bars_processed
    }

    pub fn orders_submitted(&self) -> u64 {
        self.orders_submitted
    }

    pub fn gateway_mut(&mut self) -> &mut dyn ExecutionGateway {
        self.gateway.as_mut()
    }

    // --- Event handlers ---

    /// Handles one completed bar.
    ///
    /// Only a gateway-side inconsistency (an order submitted while another is
    /// in flight) is returned as an error; everything else is reported
    /// through the event sink.
    pub fn on_bar(&mut self, bar: &Bar) -> Result<()> {
        if let Some(previous) = self.last_timestamp {
            if bar.timestamp() <= previous {
                self.sink.emit(EngineEvent::Anomaly(Anomaly::OutOfOrderBar {
                    timestamp: bar.timestamp(),
                    previous,
                }));
                return Ok(());
            }
        }
        self.last_timestamp = Some(bar.timestamp());
        self.bars_processed += 1;

        // 1. The estimator sees every bar, whatever happens next.
        let volatility = self.volatility.next(bar);
        if self.params.debug_logging() {
            tracing::debug!(time = %bar.timestamp(), close = %bar.close(), atr = ?volatility.map(|a| a.value()), "Bar.");
        }

        // 2. Nothing new is decided while an order is in flight.
        if let Some(pending) = self.orders.pending() {
            if self.params.debug_logging() {
                tracing::debug!(order_id = %pending.id, "Order in flight; skipping evaluation.");
            }
            return Ok(());
        }

        // 3. Evaluate.
        let position = *self.positions.position();
        let signal = self.evaluator.evaluate(bar, volatility, &position);
        self.sink.emit(EngineEvent::SignalEvaluated(SignalEvaluated {
            timestamp: bar.timestamp(),
            close: bar.close(),
            volatility: volatility.map(|a| a.value()),
            signal,
        }));

        // 4. Act.
        match signal {
            Signal::Hold => Ok(()),
            Signal::Enter => match volatility {
                Some(volatility) => self.enter(bar, volatility),
                None => Ok(()),
            },
            Signal::ExitStopLoss | Signal::ExitTakeProfit => self.exit(bar, signal, &position),
        }
    }

    /// Handles one order notification from the gateway.
    pub fn on_notification(&mut self, notification: OrderNotification) {
        for event in self.orders.on_notification(notification, &mut self.positions) {
            self.sink.emit(event);
        }

        let position = self.positions.position();
        if position.is_long() {
            // Levels follow the actual fill, not the price the entry was decided at.
            self.exit_plan = Some(self.evaluator.exit_plan(position.entry_price));
        } else if self.orders.is_idle() {
            self.exit_plan = None;
        }
    }

    /// Reports the final state. `halted` is true when the run was stopped
    /// before the feed was exhausted.
    pub fn finish(&mut self, halted: bool) -> RunReport {
        let trades = self.positions.trades().to_vec();
        let net_pnl: Decimal = trades.iter().map(|t| t.net_pnl).sum();
        let report = RunReport {
            bars_processed: self.bars_processed,
            orders_submitted: self.orders_submitted,
            net_pnl,
            final_cash: self.gateway.current_cash(),
            final_equity: self.gateway.current_equity(),
            position: *self.positions.position(),
            halted,
            trades,
        };

        self.sink.emit(EngineEvent::RunEnded(RunEnded {
            final_cash: report.final_cash,
            final_equity: report.final_equity,
            bars_processed: report.bars_processed,
            trades: report.trades.len(),
            net_pnl: report.net_pnl,
            volatility_period: self.params.volatility_period(),
            halted,
        }));
        report
    }

    fn enter(&mut self, bar: &Bar, volatility: Atr) -> Result<()> {
        let price = bar.close();
        let equity = self.gateway.current_equity();
        let size = risk_based_size(equity, self.params.risk_per_trade_percent(), price, self.params.stop_loss_factor())
            .and_then(|raw| self.sizing.round(raw));

        let size = match size {
            Ok(size) => size,
            Err(e) => {
                self.sink.emit(EngineEvent::EntrySkipped {
                    timestamp: bar.timestamp(),
                    reason: e.to_string(),
                });
                return Ok(());
            }
        };

        let plan = self.evaluator.exit_plan(price);
        if self.params.debug_logging() {
            tracing::debug!(
                %price,
                atr = %volatility.value(),
                threshold = %self.evaluator.entry_threshold(volatility),
                %size,
                stop_loss = %plan.stop_loss,
                take_profit = %plan.take_profit,
                "Entry signal."
            );
        }

        let intent = OrderIntent { side: Side::Buy, size, reference_price: price };
        self.submit(intent, Some(plan))
    }

    fn exit(&mut self, bar: &Bar, signal: Signal, position: &Position) -> Result<()> {
        if self.params.debug_logging() {
            let reason = if signal == Signal::ExitStopLoss { "stop loss" } else { "take profit" };
            tracing::debug!(price = %bar.close(), %reason, "Exit signal.");
        }

        let intent = OrderIntent { side: Side::Sell, size: position.size, reference_price: bar.close() };
        self.submit(intent, None)
    }

    fn submit(&mut self, intent: OrderIntent, exit_plan: Option<ExitPlan>) -> Result<()> {
        match self.orders.submit(intent, self.gateway.as_mut()) {
            Ok(order_id) => {
                self.orders_submitted += 1;
                if exit_plan.is_some() {
                    self.exit_plan = exit_plan;
                }
                self.sink.emit(EngineEvent::OrderSubmitted(OrderSubmitted {
                    order_id,
                    side: intent.side,
                    size: intent.size,
                    reference_price: intent.reference_price,
                    exit_plan,
                }));
                Ok(())
            }
            Err(Error::Submission(e)) => {
                self.sink.emit(EngineEvent::OrderRejected { order_id: None, reason: e.to_string() });
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
