//! Driver spawns and manages the decode task

use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::{BatteryConfig, RaceBoxConfig};
use crate::protocol::{FrameDecoder, FrameResult, interpret};
use crate::provider::Provider;
use crate::types::{LinkStats, Notification, ShutdownReason, TelemetryRecord, decode_serial_number};

/// Consecutive provider errors tolerated before the link is dropped
const MAX_ERRORS: u32 = 10;

/// Receivers for everything the decode task publishes
pub struct DriverChannels {
    /// Latest decoded record; `None` before the first one
    pub records: watch::Receiver<Option<Arc<TelemetryRecord>>>,
    /// Serial number, once the device has reported it
    pub serial_number: watch::Receiver<Option<String>>,
    /// Link statistics, updated per notification
    pub stats: watch::Receiver<LinkStats>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

/// Low battery policy.
///
/// The first reading after a (re)connect is unreliable, the device tends to
/// report 0%, so it never triggers a shutdown.
#[derive(Debug, Clone)]
pub struct BatteryMonitor {
    config: BatteryConfig,
    seen_first_reading: bool,
}

impl BatteryMonitor {
    pub fn new(config: BatteryConfig) -> Self {
        Self { config, seen_first_reading: false }
    }

    /// Returns true when the link should be stopped.
    pub fn observe(&mut self, level: u8) -> bool {
        if !self.seen_first_reading {
            self.seen_first_reading = true;
            return false;
        }
        self.config.enabled && level <= self.config.shutdown_threshold
    }
}

/// Result of handling one notification
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Record { record: Arc<TelemetryRecord>, low_battery: bool },
    SerialNumber(String),
    /// Rejected chunk, pending fragment or unhandled characteristic
    Nothing,
}

/// Synchronous per-connection pipeline: decoder, interpreter, battery policy
/// and statistics.
#[derive(Debug)]
pub struct LinkProcessor {
    decoder: FrameDecoder,
    battery: BatteryMonitor,
    stats: LinkStats,
    started: Instant,
}

impl LinkProcessor {
    pub fn new(config: &RaceBoxConfig) -> Self {
        Self {
            decoder: FrameDecoder::new(config.decoder.options()),
            battery: BatteryMonitor::new(config.battery.clone()),
            stats: LinkStats::default(),
            started: Instant::now(),
        }
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn handle(&mut self, notification: Notification) -> Step {
        let step = match notification {
            Notification::Telemetry(chunk) => self.handle_chunk(&chunk),
            Notification::SerialNumber(value) => {
                let serial = decode_serial_number(&value);
                info!(serial = %serial, "Serial number received");
                Step::SerialNumber(serial)
            }
            Notification::Unhandled { characteristic, len } => {
                debug!(%characteristic, len, "Unhandled characteristic");
                self.stats.unhandled_notifications += 1;
                Step::Nothing
            }
        };
        self.stats.decode = self.decoder.counters();
        step
    }

    fn handle_chunk(&mut self, chunk: &[u8]) -> Step {
        match self.decoder.submit_at(chunk, Instant::now().into_std()) {
            FrameResult::Complete(payload) => {
                let record = interpret(&payload);
                self.stats.records += 1;
                let elapsed = self.started.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    self.stats.packet_rate_hz = self.stats.records as f64 / elapsed;
                }
                trace!(
                    records = self.stats.records,
                    fix = record.fix_status_label(),
                    battery = record.battery_level,
                    "Record decoded"
                );

                let low_battery = self.battery.observe(record.battery_level);
                Step::Record { record: Arc::new(record), low_battery }
            }
            FrameResult::Incomplete => Step::Nothing,
            FrameResult::Rejected(reason) => {
                debug!(%reason, "Chunk dropped");
                Step::Nothing
            }
        }
    }

    fn shut_down(&mut self, reason: ShutdownReason) -> &LinkStats {
        self.stats.shutdown = Some(reason);
        &self.stats
    }
}

/// Driver spawns and manages the decode task
///
/// One task per connection owns the provider and the [`LinkProcessor`], so
/// every chunk is decoded to completion before the next is read.
pub struct Driver;

impl Driver {
    /// Spawn the decode task for the given provider
    pub fn spawn<P>(provider: P, config: &RaceBoxConfig) -> DriverChannels
    where
        P: Provider,
    {
        let (record_tx, record_rx) = watch::channel(None);
        let (serial_tx, serial_rx) = watch::channel(None);
        let (stats_tx, stats_rx) = watch::channel(LinkStats::default());

        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();
        let processor = LinkProcessor::new(config);

        tokio::spawn(async move {
            Self::decode_task(provider, processor, record_tx, serial_tx, stats_tx, cancel_task)
                .await;
        });

        DriverChannels { records: record_rx, serial_number: serial_rx, stats: stats_rx, cancel }
    }

    async fn decode_task<P>(
        mut provider: P,
        mut processor: LinkProcessor,
        record_tx: watch::Sender<Option<Arc<TelemetryRecord>>>,
        serial_tx: watch::Sender<Option<String>>,
        stats_tx: watch::Sender<LinkStats>,
        cancel: CancellationToken,
    ) where
        P: Provider,
    {
        info!(nominal_rate = provider.nominal_rate(), "Decode task started");
        let mut error_count = 0u32;

        let reason = loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Decode task cancelled");
                    break ShutdownReason::Disconnected;
                }
                result = provider.next_notification() => result,
            };

            match result {
                Ok(Some(notification)) => {
                    error_count = 0;
                    let step = processor.handle(notification);

                    let mut low_battery = None;
                    match step {
                        Step::Record { record, low_battery: shutdown } => {
                            if shutdown {
                                low_battery = Some(record.battery_level);
                            }
                            if record_tx.send(Some(record)).is_err() {
                                debug!("Record receivers dropped, shutting down");
                                break ShutdownReason::Disconnected;
                            }
                        }
                        Step::SerialNumber(serial) => {
                            serial_tx.send_replace(Some(serial));
                        }
                        Step::Nothing => {}
                    }
                    stats_tx.send_replace(processor.stats().clone());

                    if let Some(level) = low_battery {
                        warn!(level, "Battery at or below shutdown threshold, disconnecting");
                        break ShutdownReason::LowBattery { level };
                    }
                }
                Ok(None) => {
                    info!("Notification source ended after {} records", processor.stats().records);
                    break ShutdownReason::StreamEnded;
                }
                Err(e) => {
                    error_count += 1;
                    warn!("Provider error ({}/{}): {}", error_count, MAX_ERRORS, e);

                    if error_count >= MAX_ERRORS {
                        error!("Too many provider errors, shutting down");
                        break ShutdownReason::ProviderFailed;
                    }

                    // Exponential backoff: 100ms, 200ms, 400ms, ...
                    let backoff = std::time::Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::time::sleep(backoff).await;
                }
            }
        };

        let stats = processor.shut_down(reason).clone();
        info!(
            ?reason,
            records = stats.records,
            rejected = stats.decode.rejected(),
            "Decode task ended"
        );
        // The last record stays current; dropping the senders ends subscriptions
        stats_tx.send_replace(stats);
        cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode_frame;
    use crate::test_utils::{payload_with_battery, sample_fields};

    fn telemetry(battery: u8) -> Notification {
        Notification::Telemetry(encode_frame(payload_with_battery(battery).as_bytes()))
    }

    #[test]
    fn battery_monitor_skips_first_reading() {
        let mut monitor = BatteryMonitor::new(BatteryConfig::default());
        assert!(!monitor.observe(0));
        assert!(!monitor.observe(50));
        assert!(monitor.observe(2));
        assert!(monitor.observe(1));
    }

    #[test]
    fn disabled_battery_monitor_never_fires() {
        let mut monitor =
            BatteryMonitor::new(BatteryConfig { enabled: false, shutdown_threshold: 2 });
        assert!(!monitor.observe(0));
        assert!(!monitor.observe(0));
    }

    #[tokio::test]
    async fn processor_counts_records_and_rejections() {
        let mut processor = LinkProcessor::new(&RaceBoxConfig::default());

        let step = processor.handle(telemetry(80));
        assert!(matches!(step, Step::Record { low_battery: false, .. }));

        let mut corrupt = encode_frame(sample_fields().to_payload().as_bytes());
        corrupt[20] ^= 0xFF;
        assert_eq!(processor.handle(Notification::Telemetry(corrupt)), Step::Nothing);

        assert_eq!(
            processor.handle(Notification::Unhandled { characteristic: "2a19".into(), len: 1 }),
            Step::Nothing
        );

        let stats = processor.stats();
        assert_eq!(stats.records, 1);
        assert_eq!(stats.decode.checksum_invalid, 1);
        assert_eq!(stats.unhandled_notifications, 1);
    }

    #[tokio::test]
    async fn processor_decodes_serial_numbers() {
        let mut processor = LinkProcessor::new(&RaceBoxConfig::default());
        assert_eq!(
            processor.handle(Notification::SerialNumber(b"3241805619".to_vec())),
            Step::SerialNumber("3241805619".to_string())
        );
    }

    #[tokio::test]
    async fn processor_flags_low_battery_after_first_reading() {
        let mut processor = LinkProcessor::new(&RaceBoxConfig::default());
        assert!(matches!(processor.handle(telemetry(0)), Step::Record { low_battery: false, .. }));
        assert!(matches!(processor.handle(telemetry(2)), Step::Record { low_battery: true, .. }));
    }
}
