//! Per-connection link statistics

use serde::Serialize;

use crate::protocol::DecodeCounters;

/// Why the driver stopped producing records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShutdownReason {
    /// Battery reached the configured shutdown threshold.
    LowBattery { level: u8 },
    /// The notification source ended.
    StreamEnded,
    /// Too many consecutive provider errors.
    ProviderFailed,
    /// Cancelled by the connection owner.
    Disconnected,
}

/// Counters published alongside the record stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkStats {
    pub decode: DecodeCounters,
    /// Records delivered to subscribers.
    pub records: u64,
    /// Records per second since the link started.
    pub packet_rate_hz: f64,
    /// Notifications from characteristics the driver does not consume.
    pub unhandled_notifications: u64,
    pub shutdown: Option<ShutdownReason>,
}

impl LinkStats {
    pub fn is_running(&self) -> bool {
        self.shutdown.is_none()
    }
}
