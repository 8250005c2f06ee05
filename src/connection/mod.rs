//! Connection to a RaceBox telemetry stream
//!
//! A [`SensorConnection`] wraps the channels published by the decode task.
//! It is cheap to subscribe to: every subscription reads the same watch
//! channel, so slow subscribers only ever see the latest record.

use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::driver::DriverChannels;
use crate::stream::ThrottleExt;
use crate::types::{LinkStats, TelemetryRecord, UpdateRate};

#[cfg(test)]
mod tests;

/// Connection to one device, live or replayed
pub struct SensorConnection {
    records: watch::Receiver<Option<Arc<TelemetryRecord>>>,
    serial_number: watch::Receiver<Option<String>>,
    stats: watch::Receiver<LinkStats>,

    /// Source frequency
    source_hz: f64,

    /// Cancellation token for stopping the decode task
    cancel: CancellationToken,
}

impl SensorConnection {
    pub(crate) fn new(channels: DriverChannels, source_hz: f64) -> Self {
        Self {
            records: channels.records,
            serial_number: channels.serial_number,
            stats: channels.stats,
            source_hz,
            cancel: channels.cancel,
        }
    }

    /// Subscribe to decoded records
    ///
    /// The stream ends when the decode task stops.
    pub fn subscribe(&self, rate: UpdateRate) -> impl Stream<Item = Arc<TelemetryRecord>> + 'static {
        let records = WatchStream::new(self.records.clone()).filter_map(|opt| async move { opt });

        match rate.throttle_interval(self.source_hz) {
            None => records.boxed(),
            Some(interval) => records.throttle(interval).boxed(),
        }
    }

    /// Most recent record, if one has been decoded.
    ///
    /// Still available after the link stops, so the record that triggered a
    /// low battery shutdown can be shown.
    pub fn current_record(&self) -> Option<Arc<TelemetryRecord>> {
        self.records.borrow().clone()
    }

    /// Serial number reported by the device information service
    pub fn serial_number(&self) -> Option<String> {
        self.serial_number.borrow().clone()
    }

    /// Snapshot of the link statistics
    pub fn stats(&self) -> LinkStats {
        self.stats.borrow().clone()
    }

    /// Link statistics as they change
    pub fn stats_updates(&self) -> impl Stream<Item = LinkStats> + 'static {
        WatchStream::new(self.stats.clone())
    }

    pub fn is_running(&self) -> bool {
        self.stats.borrow().is_running()
    }

    /// Get the source telemetry frequency
    pub fn source_hz(&self) -> f64 {
        self.source_hz
    }

    /// Stop the decode task. Subscriptions end once it has shut down.
    pub fn disconnect(&self) {
        debug!("Disconnect requested");
        self.cancel.cancel();
    }

    /// Wait until a first record is available or the link stops.
    ///
    /// Returns false if the link stopped without producing a record.
    pub(crate) async fn wait_for_first_record(&self) -> bool {
        let mut records = self.records.clone();
        records.wait_for(|record| record.is_some()).await.is_ok()
    }
}

impl Drop for SensorConnection {
    fn drop(&mut self) {
        debug!("Dropping sensor connection");
        self.cancel.cancel();
    }
}
