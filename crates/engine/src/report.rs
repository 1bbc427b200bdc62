// In crates/engine/src/report.rs

use core_types::{Position, Trade};
use rust_decimal::Decimal;
use serde::Serialize;

/// Summary of a finished (or halted) run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub bars_processed: u64,
    pub orders_submitted: u64,
    pub trades: Vec<Trade>,
    pub net_pnl: Decimal,
    pub final_cash: Decimal,
    pub final_equity: Decimal,
    /// Whatever was still open when the run stopped.
    pub position: Position,
    pub halted: bool,
}
