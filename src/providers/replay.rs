//! Replay provider for recorded notification captures
//!
//! A capture is a text file with one notification per line:
//!
//! ```text
//! # recorded 2022-09-13, RaceBox Mini
//! serial 33323431383035363139
//! tx b562ff015000...
//! b562ff012800...          # no prefix means tx
//! ```
//!
//! Hex digits may be grouped with spaces. Blank lines and `#` comments are
//! ignored.

use std::path::Path;
use tokio::time::{Duration, Interval, MissedTickBehavior, interval};
use tracing::{debug, info, trace};

use crate::provider::Provider;
use crate::types::Notification;
use crate::{Result, TelemetryError};

/// Parse the text of a capture file.
pub fn parse_capture(text: &str) -> Result<Vec<Notification>> {
    let mut notifications = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let (kind, digits) = match line.split_once(char::is_whitespace) {
            Some(("tx", rest)) => ("tx", rest),
            Some(("serial", rest)) => ("serial", rest),
            _ => ("tx", line),
        };
        let digits: String = digits.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = hex::decode(&digits).map_err(|e| {
            TelemetryError::parse_error(format!("capture line {}", index + 1), e.to_string())
        })?;

        notifications.push(match kind {
            "serial" => Notification::SerialNumber(bytes),
            _ => Notification::Telemetry(bytes),
        });
    }

    Ok(notifications)
}

/// Replay provider that plays back a capture at the device's cadence
pub struct ReplayProvider {
    notifications: std::vec::IntoIter<Notification>,

    /// Total notifications in the capture
    total: usize,

    /// Notifications delivered so far
    position: usize,

    /// Playback speed multiplier (1.0 = device rate)
    speed: f64,

    nominal_rate: f64,

    /// Created on first read so construction does not need a runtime
    interval: Option<Interval>,
}

impl ReplayProvider {
    /// Open a capture file.
    pub fn open<P: AsRef<Path>>(path: P, nominal_rate: f64) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        let notifications = parse_capture(&text)?;

        info!("Opened capture {}: {} notifications", path.display(), notifications.len());
        Ok(Self::from_notifications(notifications, nominal_rate))
    }

    pub fn from_notifications(notifications: Vec<Notification>, nominal_rate: f64) -> Self {
        Self {
            total: notifications.len(),
            notifications: notifications.into_iter(),
            position: 0,
            speed: 1.0,
            nominal_rate,
            interval: None,
        }
    }

    /// Set playback speed, clamped to 0.1..=100. Non-finite speeds play at
    /// device rate.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = if speed.is_finite() { speed.clamp(0.1, 100.0) } else { 1.0 };
        self.interval = None;
        debug!("Playback speed set to {}x", self.speed);
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Notifications not yet delivered
    pub fn remaining(&self) -> usize {
        self.total - self.position
    }

    fn pacing(&mut self) -> &mut Interval {
        let period = Duration::from_secs_f64(1.0 / (self.nominal_rate * self.speed));
        self.interval.get_or_insert_with(|| {
            let mut interval = interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        })
    }
}

#[async_trait::async_trait]
impl Provider for ReplayProvider {
    async fn next_notification(&mut self) -> Result<Option<Notification>> {
        let Some(notification) = self.notifications.next() else {
            debug!("Reached end of capture");
            return Ok(None);
        };
        self.position += 1;

        // Only telemetry is paced; the serial number read is one-off
        if matches!(notification, Notification::Telemetry(_)) {
            self.pacing().tick().await;
        }

        trace!("Notification {}/{}", self.position, self.total);
        Ok(Some(notification))
    }

    fn nominal_rate(&self) -> f64 {
        self.nominal_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_bare_and_grouped_lines() {
        let text = "\
# header comment

serial 3332 3431
tx b562 ff01 0000 0000
b562ff0100000000   # trailing comment
";
        let notifications = parse_capture(text).unwrap();
        assert_eq!(
            notifications,
            vec![
                Notification::SerialNumber(b"3241".to_vec()),
                Notification::Telemetry(vec![0xB5, 0x62, 0xFF, 0x01, 0, 0, 0, 0]),
                Notification::Telemetry(vec![0xB5, 0x62, 0xFF, 0x01, 0, 0, 0, 0]),
            ]
        );
    }

    #[test]
    fn bad_hex_reports_the_line() {
        let err = parse_capture("tx b562\ntx zz\n").unwrap_err();
        match err {
            TelemetryError::Parse { context, .. } => assert_eq!(context, "capture line 2"),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let err = ReplayProvider::open("/definitely/not/here.hex", 25.0).err().unwrap();
        assert!(matches!(err, TelemetryError::File { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn non_finite_speeds_fall_back_to_device_rate() {
        let mut provider =
            ReplayProvider::from_notifications(vec![Notification::Telemetry(vec![1])], 25.0);
        for speed in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            provider.set_speed(speed);
            assert_eq!(provider.speed(), 1.0);
        }
        provider.set_speed(1000.0);
        assert_eq!(provider.speed(), 100.0);

        provider.set_speed(f64::NAN);
        assert_eq!(provider.next_notification().await.unwrap(), Some(Notification::Telemetry(vec![1])));
    }

    #[tokio::test(start_paused = true)]
    async fn replays_everything_then_ends() {
        let mut provider = ReplayProvider::from_notifications(
            vec![
                Notification::SerialNumber(b"1".to_vec()),
                Notification::Telemetry(vec![1]),
                Notification::Telemetry(vec![2]),
            ],
            25.0,
        );
        provider.set_speed(4.0);
        assert_eq!(provider.remaining(), 3);

        let mut seen = Vec::new();
        while let Some(notification) = provider.next_notification().await.unwrap() {
            seen.push(notification);
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(provider.remaining(), 0);
        assert_eq!(provider.nominal_rate(), 25.0);
    }
}
