//! Test utilities for building frames, fragments and captures
//!
//! Shared by unit tests, integration tests and benchmarks so that every
//! fixture describes the same realistic device state.

#![cfg(any(test, feature = "benchmark"))]

use crate::protocol::{FULL_PAYLOAD_LEN, Payload, PayloadFields, encode_frame};

/// A 3D fix on a mid-afternoon drive, battery at 80% and not charging.
pub fn sample_fields() -> PayloadFields {
    PayloadFields {
        itow: 239_327_000,
        year: 2022,
        month: 9,
        day: 13,
        hour: 18,
        minute: 42,
        second: 7,
        validity_flags: 0x37,
        time_accuracy: 25,
        nanoseconds: 120_000_000,
        fix_status: 3,
        fix_status_flags: 0x01,
        date_time_flags: 0xE0,
        satellites: 11,
        longitude: 236_186_020,
        latitude: 426_870_155,
        wgs_altitude: 624_000,
        msl_altitude: 586_000,
        horizontal_accuracy: 1_500,
        vertical_accuracy: 2_100,
        speed: 26_822,
        heading: 9_050_000,
        speed_accuracy: 180,
        heading_accuracy: 450_000,
        pdop: 132,
        lat_long_flags: 0,
        battery: 80,
        accel: [-3, 12, 1_002],
        gyro: [150, -75, 4_500],
    }
}

pub fn sample_payload() -> Payload {
    sample_fields().to_payload()
}

/// The sample payload with a different battery byte.
pub fn payload_with_battery(battery: u8) -> Payload {
    PayloadFields { battery, ..sample_fields() }.to_payload()
}

/// The sample payload as one complete notification.
pub fn full_frame() -> Vec<u8> {
    encode_frame(sample_payload().as_bytes())
}

/// Split a payload into framed fragments of the given sizes.
///
/// Any bytes left after the listed sizes become one final fragment.
///
/// # Panics
///
/// Panics if the sizes add up to more than a full payload.
pub fn fragmented_frames(payload: &Payload, sizes: &[usize]) -> Vec<Vec<u8>> {
    let bytes = payload.as_bytes();
    assert!(sizes.iter().sum::<usize>() <= FULL_PAYLOAD_LEN, "fragment sizes exceed payload");

    let mut frames = Vec::with_capacity(sizes.len() + 1);
    let mut start = 0;
    for &size in sizes {
        frames.push(encode_frame(&bytes[start..start + size]));
        start += size;
    }
    if start < FULL_PAYLOAD_LEN {
        frames.push(encode_frame(&bytes[start..]));
    }
    frames
}

/// Render a capture file: the serial number read followed by `tx` lines.
pub fn capture_text(serial: Option<&str>, frames: &[Vec<u8>]) -> String {
    let mut text = String::from("# synthetic capture\n");
    if let Some(serial) = serial {
        text.push_str(&format!("serial {}\n", hex::encode(serial)));
    }
    for frame in frames {
        text.push_str(&format!("tx {}\n", hex::encode(frame)));
    }
    text
}
