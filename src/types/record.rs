//! Decoded telemetry record

use jiff::Timestamp;
use serde::Serialize;

use super::{FixStatus, ValidityFlags};

/// Three-axis measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Axes {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One decoded, unit-converted payload.
///
/// Built fresh for every payload and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    /// UTC date and time. `None` only when the year cannot be represented.
    pub timestamp: Option<Timestamp>,
    pub fix_status: FixStatus,
    pub validity: ValidityFlags,
    pub satellites: i32,
    /// Decimal degrees
    pub longitude: f64,
    /// Decimal degrees
    pub latitude: f64,
    /// Height above the WGS84 ellipsoid, feet
    pub altitude_ft: f64,
    /// Height above mean sea level, feet
    pub msl_altitude_ft: f64,
    pub speed_mph: f64,
    /// Heading of motion, decimal degrees
    pub heading: f64,
    /// Position dilution of precision
    pub pdop: f64,
    pub battery_charging: bool,
    /// Percent
    pub battery_level: u8,
    /// g
    pub acceleration: Axes,
    /// Degrees per second
    pub angular_rate: Axes,
}

impl TelemetryRecord {
    pub fn fix_status_label(&self) -> &'static str {
        self.fix_status.label()
    }

    pub fn validity_description(&self) -> String {
        self.validity.describe()
    }
}
