//! GNSS fix status

use serde::{Serialize, Serializer};

/// Label for fix codes with no known meaning.
pub const UNRECOGNIZED_FIX_STATUS: &str = "Error parsing fix status value";

/// Fix status code of the payload (offset 20).
///
/// Unknown codes are kept rather than treated as errors. Serializes as its
/// label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixStatus {
    NoFix,
    Fix2D,
    Fix3D,
    Unrecognized(i8),
}

impl FixStatus {
    pub fn from_raw(raw: i8) -> Self {
        match raw {
            0 => FixStatus::NoFix,
            2 => FixStatus::Fix2D,
            3 => FixStatus::Fix3D,
            other => FixStatus::Unrecognized(other),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FixStatus::NoFix => "no fix",
            FixStatus::Fix2D => "2D fix",
            FixStatus::Fix3D => "3D fix",
            FixStatus::Unrecognized(_) => UNRECOGNIZED_FIX_STATUS,
        }
    }

    pub fn has_fix(&self) -> bool {
        matches!(self, FixStatus::Fix2D | FixStatus::Fix3D)
    }
}

impl std::fmt::Display for FixStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for FixStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
