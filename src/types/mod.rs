//! Decoded telemetry types.
//!
//! - [`TelemetryRecord`] is the unit-converted output of one payload
//! - [`FixStatus`], [`ValidityFlags`] and [`BatteryStatus`] decode the status
//!   bytes and carry their human-readable labels
//! - [`Notification`] models value updates from the platform Bluetooth stack
//! - [`LinkStats`] and [`UpdateRate`] belong to the streaming layer
//!
//! ## Usage Example
//!
//! ```rust
//! use racebox::types::{BatteryStatus, FixStatus, ValidityFlags};
//!
//! let battery = BatteryStatus(0x96);
//! assert!(battery.charging());
//! assert_eq!(battery.level(), 22);
//!
//! assert_eq!(FixStatus::from_raw(3).label(), "3D fix");
//! assert_eq!(ValidityFlags(0x03).describe(), "valid date\nvalid time");
//! ```

mod battery;
mod fix_status;
mod notification;
mod record;
mod stats;
mod update_rate;
pub mod validity;

pub use battery::BatteryStatus;
pub use fix_status::{FixStatus, UNRECOGNIZED_FIX_STATUS};
pub use notification::{
    DEVICE_INFO_SERVICE_UUID, Notification, SERIAL_NUMBER_CHARACTERISTIC_UUID,
    TX_CHARACTERISTIC_UUID, UART_SERVICE_UUID, decode_serial_number,
};
pub use record::{Axes, TelemetryRecord};
pub use stats::{LinkStats, ShutdownReason};
pub use update_rate::UpdateRate;
pub use validity::{NO_VALIDITY_FLAGS, ValidityFlags};
