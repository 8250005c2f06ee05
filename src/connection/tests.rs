//! Tests for the connection layer
//!
//! These drive a real decode task through a channel provider and check what
//! subscribers, the serial number and the link statistics observe.

use super::*;
use crate::config::RaceBoxConfig;
use crate::driver::Driver;
use crate::protocol::encode_frame;
use crate::provider::Provider;
use crate::providers::{ChannelProvider, NotificationSink};
use crate::test_utils::{fragmented_frames, full_frame, payload_with_battery, sample_payload};
use crate::types::{Notification, SERIAL_NUMBER_CHARACTERISTIC_UUID, ShutdownReason};
use crate::{Result, TelemetryError};
use std::time::Duration;

fn attach_with(config: RaceBoxConfig) -> (NotificationSink, SensorConnection) {
    let (sink, provider) =
        ChannelProvider::new(config.link.channel_capacity, config.link.nominal_rate_hz);
    let channels = Driver::spawn(provider, &config);
    (sink, SensorConnection::new(channels, config.link.nominal_rate_hz))
}

fn attach() -> (NotificationSink, SensorConnection) {
    attach_with(RaceBoxConfig::default())
}

async fn wait_for_stats(
    connection: &SensorConnection,
    predicate: impl FnMut(&LinkStats) -> bool,
) -> LinkStats {
    let mut stats = connection.stats.clone();
    tokio::time::timeout(Duration::from_secs(30), stats.wait_for(predicate))
        .await
        .expect("timed out waiting for link stats")
        .expect("decode task dropped its stats channel")
        .clone()
}

struct FailingProvider;

#[async_trait::async_trait]
impl Provider for FailingProvider {
    async fn next_notification(&mut self) -> Result<Option<Notification>> {
        Err(TelemetryError::connection_failed("link lost"))
    }

    fn nominal_rate(&self) -> f64 {
        25.0
    }
}

#[tokio::test]
async fn records_flow_from_sink_to_subscribers() {
    let _ = tracing_subscriber::fmt::try_init();
    let (sink, connection) = attach();
    let mut records = connection.subscribe(UpdateRate::Native);

    sink.push(Notification::Telemetry(full_frame())).unwrap();

    let record = tokio::time::timeout(Duration::from_secs(5), records.next())
        .await
        .expect("timed out waiting for a record")
        .expect("stream ended early");
    assert_eq!(record.battery_level, 80);
    assert_eq!(record.fix_status_label(), "3D fix");
    assert_eq!(connection.current_record(), Some(record));

    let stats = wait_for_stats(&connection, |s| s.records == 1).await;
    assert_eq!(stats.decode.complete, 1);
    assert!(connection.is_running());
}

#[tokio::test]
async fn fragmented_notifications_produce_one_record() {
    let (sink, connection) = attach();

    for fragment in fragmented_frames(&sample_payload(), &[20, 35]) {
        sink.send(Notification::Telemetry(fragment)).await.unwrap();
    }

    let stats = wait_for_stats(&connection, |s| s.records == 1).await;
    assert_eq!(stats.decode.fragments, 3);
    assert_eq!(stats.decode.reassembled, 1);
    assert_eq!(connection.current_record().unwrap().battery_level, 80);
}

#[tokio::test]
async fn corrupt_chunks_are_counted_not_delivered() {
    let (sink, connection) = attach();

    let mut corrupt = full_frame();
    corrupt[30] ^= 0x55;
    sink.send(Notification::Telemetry(corrupt)).await.unwrap();
    sink.send(Notification::Telemetry(vec![0xB5, 0x62])).await.unwrap();
    sink.send(Notification::Unhandled { characteristic: "2a19".into(), len: 1 }).await.unwrap();

    let stats = wait_for_stats(&connection, |s| s.unhandled_notifications == 1).await;
    assert_eq!(stats.decode.checksum_invalid, 1);
    assert_eq!(stats.decode.truncated, 1);
    assert_eq!(stats.records, 0);
    assert!(connection.current_record().is_none());
}

#[tokio::test]
async fn serial_number_is_published() {
    let (sink, connection) = attach();
    assert_eq!(connection.serial_number(), None);

    sink.push_characteristic(SERIAL_NUMBER_CHARACTERISTIC_UUID, b"3241805619\0".to_vec())
        .unwrap();

    let mut serial = connection.serial_number.clone();
    tokio::time::timeout(Duration::from_secs(5), serial.wait_for(|s| s.is_some()))
        .await
        .expect("timed out waiting for serial number")
        .unwrap();
    assert_eq!(connection.serial_number().as_deref(), Some("3241805619"));
}

#[tokio::test]
async fn low_battery_stops_the_link() {
    let (sink, connection) = attach();
    let records = connection.subscribe(UpdateRate::Native);

    // The first reading is ignored even when it reads empty
    for battery in [0, 40, 2, 90] {
        let frame = encode_frame(payload_with_battery(battery).as_bytes());
        // The link may already be down by the last send
        let _ = sink.send(Notification::Telemetry(frame)).await;
    }

    let stats = wait_for_stats(&connection, |s| !s.is_running()).await;
    assert_eq!(stats.shutdown, Some(ShutdownReason::LowBattery { level: 2 }));
    assert_eq!(stats.records, 3);

    let delivered: Vec<_> = tokio::time::timeout(Duration::from_secs(5), records.collect())
        .await
        .expect("record stream did not end");
    assert!(delivered.iter().all(|r| r.battery_level != 90));
    assert_eq!(delivered.last().map(|r| r.battery_level), Some(2));
}

#[tokio::test]
async fn record_that_triggered_shutdown_stays_visible() {
    let (sink, connection) = attach();
    let records = connection.subscribe(UpdateRate::Native);

    for battery in [40, 2] {
        let frame = encode_frame(payload_with_battery(battery).as_bytes());
        sink.send(Notification::Telemetry(frame)).await.unwrap();
    }

    let delivered: Vec<_> = tokio::time::timeout(Duration::from_secs(5), records.collect())
        .await
        .expect("record stream did not end");
    assert_eq!(delivered.last().map(|r| r.battery_level), Some(2));

    assert!(!connection.is_running());
    assert_eq!(connection.current_record().map(|r| r.battery_level), Some(2));

    // Late subscribers still see it once, then the stream ends
    let late: Vec<_> = tokio::time::timeout(
        Duration::from_secs(5),
        connection.subscribe(UpdateRate::Native).collect(),
    )
    .await
    .expect("late stream did not end");
    assert_eq!(late.iter().map(|r| r.battery_level).collect::<Vec<_>>(), vec![2]);
}

#[tokio::test]
async fn disabled_battery_policy_keeps_the_link_up() {
    let mut config = RaceBoxConfig::default();
    config.battery.enabled = false;
    let (sink, connection) = attach_with(config);

    for battery in [50, 1, 0] {
        let frame = encode_frame(payload_with_battery(battery).as_bytes());
        sink.send(Notification::Telemetry(frame)).await.unwrap();
    }

    let stats = wait_for_stats(&connection, |s| s.records == 3).await;
    assert!(stats.is_running());
}

#[tokio::test]
async fn dropping_every_sink_ends_the_stream() {
    let (sink, connection) = attach();
    let records = connection.subscribe(UpdateRate::Max(5));
    drop(sink);

    let delivered: Vec<_> = tokio::time::timeout(Duration::from_secs(5), records.collect())
        .await
        .expect("record stream did not end");
    assert!(delivered.is_empty());
    assert_eq!(connection.stats().shutdown, Some(ShutdownReason::StreamEnded));
}

#[tokio::test]
async fn disconnect_cancels_the_decode_task() {
    let (sink, connection) = attach();
    connection.disconnect();

    let stats = wait_for_stats(&connection, |s| !s.is_running()).await;
    assert_eq!(stats.shutdown, Some(ShutdownReason::Disconnected));

    // The provider was dropped with the task
    tokio::time::timeout(Duration::from_secs(5), async {
        while !sink.is_closed() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("notification channel still open");
}

#[tokio::test(start_paused = true)]
async fn repeated_provider_errors_fail_the_link() {
    let config = RaceBoxConfig::default();
    let connection = SensorConnection::new(Driver::spawn(FailingProvider, &config), 25.0);

    let stats = wait_for_stats(&connection, |s| !s.is_running()).await;
    assert_eq!(stats.shutdown, Some(ShutdownReason::ProviderFailed));
}

#[tokio::test]
async fn stats_updates_report_progress() {
    let (sink, connection) = attach();
    let updates = connection.stats_updates();

    sink.send(Notification::Telemetry(full_frame())).await.unwrap();
    drop(sink);

    let last = tokio::time::timeout(Duration::from_secs(5), updates.collect::<Vec<_>>())
        .await
        .expect("stats stream did not end")
        .pop()
        .unwrap();
    assert_eq!(last.records, 1);
    assert_eq!(last.shutdown, Some(ShutdownReason::StreamEnded));
}
