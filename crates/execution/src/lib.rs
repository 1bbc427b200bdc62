// In crates/execution/src/lib.rs

use core_types::{Bar, OrderId, OrderIntent};
use rust_decimal::Decimal;
pub mod simulated;
pub mod error;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use simulated::SimulatedGateway;
pub use types::SimulationSettings;

/// The universal interface to a broker or exchange.
///
/// Submission is fire-and-forget: `submit` only acknowledges receipt by
/// returning an `OrderId`. Everything that happens to the order afterwards
/// (acceptance, fill, rejection, cancellation) is delivered later as an
/// `OrderNotification` on the channel the gateway was built with.
pub trait ExecutionGateway: Send {
    /// The name of the gateway (e.g., "SimulatedGateway").
    fn name(&self) -> &'static str;

    /// Hands an order intent to the venue.
    ///
    /// Returns the assigned id, or an `Error` if the venue refused to take it
    /// at all. Must not block on the venue's response.
    fn submit(&mut self, intent: &OrderIntent) -> Result<OrderId>;

    /// Called with each new bar before the engine sees it. Simulated venues
    /// use this to work their open orders; live venues can ignore it.
    fn on_market_data(&mut self, _bar: &Bar) {}

    /// Free cash in the account.
    fn current_cash(&self) -> Decimal;

    /// Cash plus the marked value of open positions.
    fn current_equity(&self) -> Decimal;
}
