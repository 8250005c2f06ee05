//! Fixed 80-byte payload layout of the RaceBox data message.
//!
//! All multi-byte fields are little-endian. Offsets are relative to the start
//! of the payload, not the frame.

use serde::Serialize;

use super::frame::FULL_PAYLOAD_LEN;
use crate::{Result, TelemetryError};

/// Byte offsets of every payload field.
pub mod offsets {
    pub const ITOW: usize = 0;
    pub const YEAR: usize = 4;
    pub const MONTH: usize = 6;
    pub const DAY: usize = 7;
    pub const HOUR: usize = 8;
    pub const MINUTE: usize = 9;
    pub const SECOND: usize = 10;
    pub const VALIDITY_FLAGS: usize = 11;
    pub const TIME_ACCURACY: usize = 12;
    pub const NANOSECONDS: usize = 16;
    pub const FIX_STATUS: usize = 20;
    pub const FIX_STATUS_FLAGS: usize = 21;
    pub const DATE_TIME_FLAGS: usize = 22;
    pub const SATELLITES: usize = 23;
    pub const LONGITUDE: usize = 24;
    pub const LATITUDE: usize = 28;
    pub const WGS_ALTITUDE: usize = 32;
    pub const MSL_ALTITUDE: usize = 36;
    pub const HORIZONTAL_ACCURACY: usize = 40;
    pub const VERTICAL_ACCURACY: usize = 44;
    pub const SPEED: usize = 48;
    pub const HEADING: usize = 52;
    pub const SPEED_ACCURACY: usize = 56;
    pub const HEADING_ACCURACY: usize = 60;
    pub const PDOP: usize = 64;
    pub const LAT_LONG_FLAGS: usize = 66;
    pub const BATTERY: usize = 67;
    pub const ACCEL: [usize; 3] = [68, 70, 72];
    pub const GYRO: [usize; 3] = [74, 76, 78];
}

/// A complete, reassembled payload.
#[derive(Clone, PartialEq, Eq)]
pub struct Payload([u8; FULL_PAYLOAD_LEN]);

impl Payload {
    pub fn new(bytes: [u8; FULL_PAYLOAD_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FULL_PAYLOAD_LEN] {
        &self.0
    }

    /// Decode every wire field.
    pub fn fields(&self) -> PayloadFields {
        PayloadFields::from_payload(self)
    }
}

impl TryFrom<&[u8]> for Payload {
    type Error = TelemetryError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let array = <[u8; FULL_PAYLOAD_LEN]>::try_from(bytes).map_err(|_| {
            TelemetryError::Payload { expected: FULL_PAYLOAD_LEN, found: bytes.len() }
        })?;
        Ok(Self(array))
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Payload({})", hex::encode(self.0))
    }
}

/// Raw wire fields of one payload, before any unit conversion.
///
/// Accuracy and flag fields are kept here even though the telemetry record
/// does not surface them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PayloadFields {
    /// GPS time of week (ms)
    pub itow: u32,
    pub year: u16,
    pub month: i8,
    pub day: i8,
    pub hour: i8,
    pub minute: i8,
    pub second: i8,
    pub validity_flags: u8,
    /// Time accuracy estimate (ns)
    pub time_accuracy: u32,
    /// Signed sub-second correction (ns)
    pub nanoseconds: i32,
    pub fix_status: i8,
    pub fix_status_flags: u8,
    pub date_time_flags: u8,
    pub satellites: i8,
    /// Degrees × 1e7
    pub longitude: i32,
    /// Degrees × 1e7
    pub latitude: i32,
    /// Height above ellipsoid (mm)
    pub wgs_altitude: i32,
    /// Height above mean sea level (mm)
    pub msl_altitude: i32,
    pub horizontal_accuracy: u32,
    pub vertical_accuracy: u32,
    /// Ground speed (mm/s)
    pub speed: i32,
    /// Heading of motion, degrees × 1e5
    pub heading: i32,
    pub speed_accuracy: u32,
    pub heading_accuracy: u32,
    /// Position dilution of precision × 100
    pub pdop: u16,
    pub lat_long_flags: u8,
    pub battery: u8,
    /// Milli-g, X/Y/Z
    pub accel: [i16; 3],
    /// Centi-degrees per second, X/Y/Z
    pub gyro: [i16; 3],
}

impl PayloadFields {
    /// Decode from an arbitrary slice, which must be exactly one payload long.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Payload::try_from(bytes).map(|payload| Self::from_payload(&payload))
    }

    fn from_payload(payload: &Payload) -> Self {
        use offsets::*;
        let b = payload.as_bytes();

        Self {
            itow: u32::from_le_bytes(field(b, ITOW)),
            year: u16::from_le_bytes(field(b, YEAR)),
            month: i8::from_le_bytes(field(b, MONTH)),
            day: i8::from_le_bytes(field(b, DAY)),
            hour: i8::from_le_bytes(field(b, HOUR)),
            minute: i8::from_le_bytes(field(b, MINUTE)),
            second: i8::from_le_bytes(field(b, SECOND)),
            validity_flags: b[VALIDITY_FLAGS],
            time_accuracy: u32::from_le_bytes(field(b, TIME_ACCURACY)),
            nanoseconds: i32::from_le_bytes(field(b, NANOSECONDS)),
            fix_status: i8::from_le_bytes(field(b, FIX_STATUS)),
            fix_status_flags: b[FIX_STATUS_FLAGS],
            date_time_flags: b[DATE_TIME_FLAGS],
            satellites: i8::from_le_bytes(field(b, SATELLITES)),
            longitude: i32::from_le_bytes(field(b, LONGITUDE)),
            latitude: i32::from_le_bytes(field(b, LATITUDE)),
            wgs_altitude: i32::from_le_bytes(field(b, WGS_ALTITUDE)),
            msl_altitude: i32::from_le_bytes(field(b, MSL_ALTITUDE)),
            horizontal_accuracy: u32::from_le_bytes(field(b, HORIZONTAL_ACCURACY)),
            vertical_accuracy: u32::from_le_bytes(field(b, VERTICAL_ACCURACY)),
            speed: i32::from_le_bytes(field(b, SPEED)),
            heading: i32::from_le_bytes(field(b, HEADING)),
            speed_accuracy: u32::from_le_bytes(field(b, SPEED_ACCURACY)),
            heading_accuracy: u32::from_le_bytes(field(b, HEADING_ACCURACY)),
            pdop: u16::from_le_bytes(field(b, PDOP)),
            lat_long_flags: b[LAT_LONG_FLAGS],
            battery: b[BATTERY],
            accel: ACCEL.map(|offset| i16::from_le_bytes(field(b, offset))),
            gyro: GYRO.map(|offset| i16::from_le_bytes(field(b, offset))),
        }
    }

    /// Encode back into wire layout.
    pub fn to_payload(&self) -> Payload {
        use offsets::*;
        let mut b = [0u8; FULL_PAYLOAD_LEN];

        put(&mut b, ITOW, &self.itow.to_le_bytes());
        put(&mut b, YEAR, &self.year.to_le_bytes());
        put(&mut b, MONTH, &self.month.to_le_bytes());
        put(&mut b, DAY, &self.day.to_le_bytes());
        put(&mut b, HOUR, &self.hour.to_le_bytes());
        put(&mut b, MINUTE, &self.minute.to_le_bytes());
        put(&mut b, SECOND, &self.second.to_le_bytes());
        b[VALIDITY_FLAGS] = self.validity_flags;
        put(&mut b, TIME_ACCURACY, &self.time_accuracy.to_le_bytes());
        put(&mut b, NANOSECONDS, &self.nanoseconds.to_le_bytes());
        put(&mut b, FIX_STATUS, &self.fix_status.to_le_bytes());
        b[FIX_STATUS_FLAGS] = self.fix_status_flags;
        b[DATE_TIME_FLAGS] = self.date_time_flags;
        put(&mut b, SATELLITES, &self.satellites.to_le_bytes());
        put(&mut b, LONGITUDE, &self.longitude.to_le_bytes());
        put(&mut b, LATITUDE, &self.latitude.to_le_bytes());
        put(&mut b, WGS_ALTITUDE, &self.wgs_altitude.to_le_bytes());
        put(&mut b, MSL_ALTITUDE, &self.msl_altitude.to_le_bytes());
        put(&mut b, HORIZONTAL_ACCURACY, &self.horizontal_accuracy.to_le_bytes());
        put(&mut b, VERTICAL_ACCURACY, &self.vertical_accuracy.to_le_bytes());
        put(&mut b, SPEED, &self.speed.to_le_bytes());
        put(&mut b, HEADING, &self.heading.to_le_bytes());
        put(&mut b, SPEED_ACCURACY, &self.speed_accuracy.to_le_bytes());
        put(&mut b, HEADING_ACCURACY, &self.heading_accuracy.to_le_bytes());
        put(&mut b, PDOP, &self.pdop.to_le_bytes());
        b[LAT_LONG_FLAGS] = self.lat_long_flags;
        b[BATTERY] = self.battery;
        for (offset, value) in ACCEL.iter().zip(self.accel) {
            put(&mut b, *offset, &value.to_le_bytes());
        }
        for (offset, value) in GYRO.iter().zip(self.gyro) {
            put(&mut b, *offset, &value.to_le_bytes());
        }

        Payload(b)
    }
}

// Offsets are compile-time constants inside the payload; the slice index is
// still bounds checked.
fn field<const N: usize>(bytes: &[u8; FULL_PAYLOAD_LEN], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}

fn put(bytes: &mut [u8; FULL_PAYLOAD_LEN], offset: usize, value: &[u8]) {
    bytes[offset..offset + value.len()].copy_from_slice(value);
}
