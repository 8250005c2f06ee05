//! Date/time validity flags

use serde::{Serialize, Serializer};

pub const VALID_DATE: u8 = 1 << 0;
pub const VALID_TIME: u8 = 1 << 1;
pub const FULLY_RESOLVED: u8 = 1 << 2;
pub const VALID_MAGNETIC_DECLINATION: u8 = 1 << 3;

/// Description used when no validity bit is set.
pub const NO_VALIDITY_FLAGS: &str = "all validity flags false";

const LABELS: [(u8, &str); 4] = [
    (VALID_DATE, "valid date"),
    (VALID_TIME, "valid time"),
    (FULLY_RESOLVED, "fully resolved"),
    (VALID_MAGNETIC_DECLINATION, "valid magnetic declination"),
];

/// Validity byte of the payload (offset 11).
///
/// Serializes as its human-readable description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityFlags(pub u8);

impl ValidityFlags {
    pub fn new(value: u8) -> Self {
        Self(value)
    }

    /// Check if a specific bit is set.
    pub fn is_set(&self, bit: u8) -> bool {
        bit < 8 && (self.0 & (1 << bit)) != 0
    }

    /// Check if a specific flag is set using a bitmask.
    pub fn has_flag(&self, flag: u8) -> bool {
        (self.0 & flag) != 0
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Labels of the set flags, lowest bit first. Bits 4-7 carry no label.
    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        LABELS.iter().filter(|(flag, _)| self.has_flag(*flag)).map(|(_, label)| *label)
    }

    /// Newline-joined labels, or [`NO_VALIDITY_FLAGS`].
    pub fn describe(&self) -> String {
        let labels: Vec<_> = self.labels().collect();
        if labels.is_empty() { NO_VALIDITY_FLAGS.to_string() } else { labels.join("\n") }
    }
}

impl std::fmt::Display for ValidityFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

impl Serialize for ValidityFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags() {
        assert_eq!(ValidityFlags(0x00).describe(), "all validity flags false");
    }

    #[test]
    fn valid_date_only() {
        let description = ValidityFlags(0x01).describe();
        assert_eq!(description, "valid date");
        assert!(!description.contains("valid time"));
    }

    #[test]
    fn all_four_flags() {
        let description = ValidityFlags(0x0F).describe();
        for phrase in ["valid date", "valid time", "fully resolved", "valid magnetic declination"] {
            assert!(description.contains(phrase), "missing {phrase}");
        }
        assert_eq!(description.lines().count(), 4);
    }

    #[test]
    fn high_bits_are_ignored() {
        assert_eq!(ValidityFlags(0xF0).describe(), NO_VALIDITY_FLAGS);
        assert_eq!(ValidityFlags(0xF4).describe(), "fully resolved");
    }

    #[test]
    fn bit_helpers() {
        let flags = ValidityFlags::new(0b1010);
        assert!(flags.is_set(1));
        assert!(flags.is_set(3));
        assert!(!flags.is_set(0));
        assert!(!flags.is_set(9));
        assert!(flags.has_flag(VALID_TIME));
        assert!(!flags.has_flag(VALID_DATE));
    }
}
