//! Battery status byte

use serde::Serialize;

const CHARGING_BIT: u8 = 0x80;
const LEVEL_MASK: u8 = 0x7F;

/// Battery byte of the payload (offset 67): top bit is the charging flag,
/// the low seven bits the charge percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatteryStatus(pub u8);

impl BatteryStatus {
    pub fn charging(&self) -> bool {
        self.0 & CHARGING_BIT != 0
    }

    /// Charge level in percent.
    pub fn level(&self) -> u8 {
        self.0 & LEVEL_MASK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charging_bit_and_level() {
        let status = BatteryStatus(0x96);
        assert!(status.charging());
        assert_eq!(status.level(), 22);

        let status = BatteryStatus(0x64);
        assert!(!status.charging());
        assert_eq!(status.level(), 100);
    }
}
