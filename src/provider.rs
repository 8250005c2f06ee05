//! Provider trait for notification sources

use crate::Result;
use crate::types::Notification;

/// Trait for sources of device notifications
///
/// Providers abstract over where notifications come from (a live Bluetooth
/// link, a recorded capture) and deliver them strictly in arrival order.
#[async_trait::async_trait]
pub trait Provider: Send + 'static {
    /// Get the next notification
    ///
    /// Returns:
    /// - `Ok(Some(notification))` - Next value update
    /// - `Ok(None)` - Source ended (disconnect or end of capture)
    /// - `Err(e)` - Error occurred; the driver may retry
    async fn next_notification(&mut self) -> Result<Option<Notification>>;

    /// Nominal telemetry rate of the source in Hz
    fn nominal_rate(&self) -> f64;
}
