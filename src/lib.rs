//! Decoding for RaceBox Mini GPS/IMU telemetry over Bluetooth LE.
//!
//! The device streams 80-byte payloads inside checksummed frames on the UART
//! service's TX characteristic. Notifications arrive either whole or split
//! into framed fragments; this crate validates them, reassembles fragments,
//! and turns every payload into a unit-converted [`TelemetryRecord`].
//!
//! # Features
//!
//! - **Frame decoding**: checksum, frame start and length validation with
//!   fragment reassembly ([`protocol::FrameDecoder`])
//! - **Interpretation**: UTC timestamp, decimal degrees, feet, mph, g and
//!   degrees per second ([`protocol::interpret`])
//! - **Streaming**: a decode task per device publishing records, the serial
//!   number and link statistics to any number of subscribers
//! - **Replay**: hex capture files played back at the device's cadence
//!
//! Scanning and connecting are left to the platform Bluetooth stack; feed
//! its value updates into a [`NotificationSink`].
//!
//! ## Example (live link)
//!
//! ```rust,no_run
//! use racebox::{RaceBox, RaceBoxConfig, UpdateRate, TX_CHARACTERISTIC_UUID};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> racebox::Result<()> {
//!     let (sink, connection) = RaceBox::attach(RaceBoxConfig::default())?;
//!
//!     // In the characteristic value-update callback:
//!     sink.push_characteristic(TX_CHARACTERISTIC_UUID, vec![/* notification bytes */])?;
//!
//!     let mut records = connection.subscribe(UpdateRate::Max(5));
//!     while let Some(record) = records.next().await {
//!         println!("{:.1} mph, {}", record.speed_mph, record.fix_status_label());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
mod error;
pub mod protocol;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Stream-based telemetry architecture
pub mod connection;
pub mod driver;
pub mod provider;
pub mod providers;
pub mod stream;

pub use config::RaceBoxConfig;
pub use connection::SensorConnection;
pub use error::*;
pub use protocol::{FrameDecoder, FrameResult, Payload, PayloadFields, RejectReason, interpret};
pub use providers::{ChannelProvider, NotificationSink, ReplayProvider};
pub use types::*;

use std::path::Path;
use tracing::{info, warn};

use crate::driver::Driver;

/// Unified entry point for RaceBox telemetry connections.
///
/// # Examples
///
/// ## Capture replay
/// ```rust,no_run
/// use racebox::{RaceBox, RaceBoxConfig};
///
/// #[tokio::main]
/// async fn main() -> racebox::Result<()> {
///     let config = RaceBoxConfig::from_yaml_file("racebox.yaml")?;
///     let connection = RaceBox::open("drive.hex", config).await?;
///     println!("serial: {:?}", connection.serial_number());
///     Ok(())
/// }
/// ```
pub struct RaceBox;

impl RaceBox {
    /// Start a decode task fed by the platform Bluetooth glue.
    ///
    /// Returns the sink to push characteristic updates into and the
    /// connection to read records from. Dropping every clone of the sink
    /// ends the connection with [`ShutdownReason::StreamEnded`].
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Config`] if the configuration is invalid.
    pub fn attach(config: RaceBoxConfig) -> Result<(NotificationSink, SensorConnection)> {
        config.validate()?;

        let source_hz = config.link.nominal_rate_hz;
        let (sink, provider) = ChannelProvider::new(config.link.channel_capacity, source_hz);
        let channels = Driver::spawn(provider, &config);

        info!(source_hz, capacity = config.link.channel_capacity, "Attached notification sink");
        Ok((sink, SensorConnection::new(channels, source_hz)))
    }

    /// Open a capture file for replay.
    ///
    /// Waits up to `link.first_record_timeout_ms` for the first record so
    /// the connection is ready for subscriptions when it is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The file does not exist or is not readable
    /// - A line of the capture is not valid hex
    /// - No record is decoded before the timeout
    pub async fn open<P: AsRef<Path>>(path: P, config: RaceBoxConfig) -> Result<SensorConnection> {
        config.validate()?;
        let path = path.as_ref();
        info!("Opening capture: {}", path.display());

        let source_hz = config.link.nominal_rate_hz;
        let mut provider = ReplayProvider::open(path, source_hz)?;
        provider.set_speed(config.link.replay_speed);

        let connection = SensorConnection::new(Driver::spawn(provider, &config), source_hz);

        let timeout = config.link.first_record_timeout();
        match tokio::time::timeout(timeout, connection.wait_for_first_record()).await {
            Ok(true) => {}
            Ok(false) => warn!("Capture ended before producing a record"),
            Err(_) => {
                warn!("Timeout waiting for first record from capture");
                return Err(TelemetryError::Timeout { duration: timeout });
            }
        }

        info!("Replay connection opened ({}Hz)", source_hz);
        Ok(connection)
    }
}
