//! Transport notifications as delivered by the platform Bluetooth stack

/// Nordic UART service carrying the telemetry stream.
pub const UART_SERVICE_UUID: &str = "6e400001-b5a3-f393-e0a9-e50e24dcca9e";
/// TX characteristic: notifies telemetry frames.
pub const TX_CHARACTERISTIC_UUID: &str = "6e400003-b5a3-f393-e0a9-e50e24dcca9e";
/// Standard device information service.
pub const DEVICE_INFO_SERVICE_UUID: &str = "0000180a-0000-1000-8000-00805f9b34fb";
/// Serial number string characteristic of the device information service.
pub const SERIAL_NUMBER_CHARACTERISTIC_UUID: &str = "00002a25-0000-1000-8000-00805f9b34fb";

/// One value update from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Raw chunk from the TX characteristic.
    Telemetry(Vec<u8>),
    /// Value of the serial number characteristic.
    SerialNumber(Vec<u8>),
    /// Any other characteristic; only its identity is kept.
    Unhandled { characteristic: String, len: usize },
}

impl Notification {
    /// Route a characteristic value update by characteristic UUID.
    ///
    /// UUIDs compare case-insensitively.
    pub fn from_characteristic(uuid: &str, value: Vec<u8>) -> Self {
        if uuid.eq_ignore_ascii_case(TX_CHARACTERISTIC_UUID) {
            Notification::Telemetry(value)
        } else if uuid.eq_ignore_ascii_case(SERIAL_NUMBER_CHARACTERISTIC_UUID) {
            Notification::SerialNumber(value)
        } else {
            Notification::Unhandled { characteristic: uuid.to_string(), len: value.len() }
        }
    }
}

/// Decode the serial number characteristic.
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn decode_serial_number(value: &[u8]) -> String {
    String::from_utf8_lossy(value).trim_end_matches('\0').to_string()
}
