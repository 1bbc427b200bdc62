// In crates/engine/src/lib.rs

pub mod error;
pub mod feed;
pub mod order_manager;
pub mod position;
pub mod report;
pub mod runner;
pub mod strategy_engine;

pub use error::{Error, Result};
pub use order_manager::OrderLifecycleManager;
pub use position::{FillOutcome, InvalidFill, PositionTracker};
pub use report::RunReport;
pub use runner::{EngineInput, Runner};
pub use strategy_engine::StrategyEngine;

use app_config::Settings;
use core_types::{Bar, OrderNotification};
use events::EventSink;
use execution::SimulatedGateway;
use futures::Stream;
use tokio::sync::mpsc;

/// Wires a backtest: a [`SimulatedGateway`] built from `settings`, the
/// strategy engine on top of it, and a runner over `feed`.
pub fn simulated_runner<F>(settings: &Settings, feed: F, sink: Box<dyn EventSink>) -> Result<Runner<F>>
where
    F: Stream<Item = Bar> + Unpin,
{
    let (tx, rx) = mpsc::unbounded_channel::<OrderNotification>();
    let gateway = SimulatedGateway::new(settings.simulation().clone(), tx).map_err(|e| {
        app_config::Error::Invalid {
            field: "simulation".to_string(),
            reason: e.to_string(),
        }
    })?;
    let engine = StrategyEngine::new(
        settings.strategy(),
        Box::new(settings.sizing()),
        Box::new(gateway),
        sink,
    )?;
    Ok(Runner::new(engine, feed, rx))
}
