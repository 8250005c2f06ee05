//! Connection configuration
//!
//! Every section and field has a default, so an empty document is a valid
//! configuration:
//!
//! ```yaml
//! decoder:
//!   pending_on_full_frame: keep   # or discard
//!   fragment_timeout_ms: 500      # omit to keep fragments indefinitely
//! battery:
//!   enabled: true
//!   shutdown_threshold: 2
//! link:
//!   nominal_rate_hz: 25.0
//!   channel_capacity: 64
//!   first_record_timeout_ms: 5000
//!   replay_speed: 1.0
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol::{DecoderOptions, PendingPolicy};
use crate::{Result, TelemetryError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RaceBoxConfig {
    pub decoder: DecoderConfig,
    pub battery: BatteryConfig,
    pub link: LinkConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderConfig {
    pub pending_on_full_frame: PendingPolicy,
    pub fragment_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Stop the link when the battery runs flat
    pub enabled: bool,
    /// Percent at or below which the link is stopped
    pub shutdown_threshold: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfig {
    /// Source frequency used to normalise update rates
    pub nominal_rate_hz: f64,
    /// Bound of the notification channel
    pub channel_capacity: usize,
    /// How long a replay waits for its first record
    pub first_record_timeout_ms: u64,
    /// Capture playback speed multiplier
    pub replay_speed: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self { enabled: true, shutdown_threshold: 2 }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            nominal_rate_hz: 25.0,
            channel_capacity: 64,
            first_record_timeout_ms: 5000,
            replay_speed: 1.0,
        }
    }
}

impl DecoderConfig {
    pub fn options(&self) -> DecoderOptions {
        DecoderOptions {
            pending_on_full_frame: self.pending_on_full_frame,
            fragment_timeout: self.fragment_timeout_ms.map(Duration::from_millis),
        }
    }
}

impl LinkConfig {
    pub fn first_record_timeout(&self) -> Duration {
        Duration::from_millis(self.first_record_timeout_ms)
    }
}

impl RaceBoxConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: RaceBoxConfig =
            if yaml.trim().is_empty() { Self::default() } else { serde_yaml_ng::from_str(yaml)? };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.battery.shutdown_threshold > 100 {
            return Err(TelemetryError::config_error(format!(
                "battery.shutdown_threshold must be a percentage, got {}",
                self.battery.shutdown_threshold
            )));
        }
        if !(self.link.nominal_rate_hz.is_finite() && self.link.nominal_rate_hz > 0.0) {
            return Err(TelemetryError::config_error("link.nominal_rate_hz must be positive"));
        }
        if self.link.channel_capacity == 0 {
            return Err(TelemetryError::config_error("link.channel_capacity must be at least 1"));
        }
        if !(self.link.replay_speed.is_finite() && self.link.replay_speed > 0.0) {
            return Err(TelemetryError::config_error("link.replay_speed must be positive"));
        }
        if self.decoder.fragment_timeout_ms == Some(0) {
            return Err(TelemetryError::config_error(
                "decoder.fragment_timeout_ms must be positive; omit it to disable eviction",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(RaceBoxConfig::from_yaml_str("").unwrap(), RaceBoxConfig::default());
        assert_eq!(RaceBoxConfig::from_yaml_str("{}").unwrap(), RaceBoxConfig::default());
    }

    #[test]
    fn defaults() {
        let config = RaceBoxConfig::default();
        assert_eq!(config.decoder.options(), DecoderOptions::default());
        assert!(config.battery.enabled);
        assert_eq!(config.battery.shutdown_threshold, 2);
        assert_eq!(config.link.nominal_rate_hz, 25.0);
        assert_eq!(config.link.first_record_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = r#"
decoder:
  pending_on_full_frame: discard
  fragment_timeout_ms: 250
battery:
  shutdown_threshold: 5
"#;
        let config = RaceBoxConfig::from_yaml_str(yaml).unwrap();
        let options = config.decoder.options();
        assert_eq!(options.pending_on_full_frame, PendingPolicy::Discard);
        assert_eq!(options.fragment_timeout, Some(Duration::from_millis(250)));
        assert!(config.battery.enabled);
        assert_eq!(config.battery.shutdown_threshold, 5);
        assert_eq!(config.link, LinkConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = RaceBoxConfig::from_yaml_str("decoder:\n  timeout: 3\n").unwrap_err();
        assert!(matches!(err, TelemetryError::Config { .. }));
    }

    #[test]
    fn invalid_values_are_rejected() {
        for yaml in [
            "battery:\n  shutdown_threshold: 101\n",
            "link:\n  nominal_rate_hz: 0.0\n",
            "link:\n  channel_capacity: 0\n",
            "link:\n  replay_speed: -1.0\n",
            "decoder:\n  fragment_timeout_ms: 0\n",
        ] {
            let err = RaceBoxConfig::from_yaml_str(yaml).unwrap_err();
            assert!(matches!(err, TelemetryError::Config { .. }), "{yaml} accepted");
        }
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("racebox.yaml");
        std::fs::write(&path, "link:\n  channel_capacity: 8\n").unwrap();

        let config = RaceBoxConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.link.channel_capacity, 8);

        let missing = RaceBoxConfig::from_yaml_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(missing, TelemetryError::File { .. }));
    }
}
