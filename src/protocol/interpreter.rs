//! Payload interpretation: fixed-point wire fields to physical units.
//!
//! Stateless and total. Every 80-byte payload yields a record; values the
//! device should never send (unknown fix codes, out-of-range calendar fields)
//! are carried through rather than rejected.

use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::{SignedDuration, Span, Timestamp};

use super::payload::{Payload, PayloadFields};
use crate::types::{Axes, BatteryStatus, FixStatus, TelemetryRecord, ValidityFlags};

/// Degrees per unit of the longitude, latitude fields.
pub const DEGREES_PER_POSITION_UNIT: f64 = 1e-7;
/// Degrees per unit of the heading field.
pub const DEGREES_PER_HEADING_UNIT: f64 = 1e-5;
pub const FEET_PER_METER: f64 = 3.28084;
/// Miles per hour per mm/s.
pub const MPH_PER_MM_S: f64 = 0.00223694;
pub const MILLI_G_PER_G: f64 = 1000.0;
pub const CENTI_DEG_PER_DEG: f64 = 100.0;
pub const PDOP_SCALE: f64 = 0.01;

/// Decode a complete payload into a telemetry record.
pub fn interpret(payload: &Payload) -> TelemetryRecord {
    interpret_fields(&payload.fields())
}

/// Unit conversion over already-decoded wire fields.
pub fn interpret_fields(fields: &PayloadFields) -> TelemetryRecord {
    TelemetryRecord {
        timestamp: utc_timestamp(fields),
        fix_status: FixStatus::from_raw(fields.fix_status),
        validity: ValidityFlags(fields.validity_flags),
        satellites: i32::from(fields.satellites),
        longitude: f64::from(fields.longitude) * DEGREES_PER_POSITION_UNIT,
        latitude: f64::from(fields.latitude) * DEGREES_PER_POSITION_UNIT,
        altitude_ft: mm_to_feet(fields.wgs_altitude),
        msl_altitude_ft: mm_to_feet(fields.msl_altitude),
        speed_mph: f64::from(fields.speed) * MPH_PER_MM_S,
        heading: f64::from(fields.heading) * DEGREES_PER_HEADING_UNIT,
        pdop: f64::from(fields.pdop) * PDOP_SCALE,
        battery_charging: BatteryStatus(fields.battery).charging(),
        battery_level: BatteryStatus(fields.battery).level(),
        acceleration: scale_axes(fields.accel, MILLI_G_PER_G),
        angular_rate: scale_axes(fields.gyro, CENTI_DEG_PER_DEG),
    }
}

fn mm_to_feet(mm: i32) -> f64 {
    f64::from(mm) * 1e-3 * FEET_PER_METER
}

fn scale_axes([x, y, z]: [i16; 3], divisor: f64) -> Axes {
    Axes { x: f64::from(x) / divisor, y: f64::from(y) / divisor, z: f64::from(z) / divisor }
}

/// Build a UTC instant from the calendar fields.
///
/// Fields are normalised the way a lenient calendar does: month 0 is
/// December of the previous year, second 60 rolls into the next minute, and
/// the signed nanosecond correction may move the instant either way. Only a
/// year outside the supported range yields `None`.
fn utc_timestamp(fields: &PayloadFields) -> Option<Timestamp> {
    let year = i16::try_from(fields.year).ok()?;
    let date = Date::new(year, 1, 1)
        .ok()?
        .checked_add(Span::new().months(i64::from(fields.month) - 1))
        .ok()?
        .checked_add(Span::new().days(i64::from(fields.day) - 1))
        .ok()?;
    let midnight = date.to_zoned(TimeZone::UTC).ok()?.timestamp();

    let time_of_day = SignedDuration::from_hours(i64::from(fields.hour))
        + SignedDuration::from_mins(i64::from(fields.minute))
        + SignedDuration::from_secs(i64::from(fields.second))
        + SignedDuration::from_nanos(i64::from(fields.nanoseconds));

    midnight.checked_add(time_of_day).ok()
}
