use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::SessionError;

/// Configuration for a capture session controller.
///
/// Missing fields in a JSON document fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfiguration {
    /// Delay between signal checks while capturing (default: 1000).
    pub signal_poll_interval_ms: u64,

    /// How long a signal monitor keeps polling after capture starts
    /// (default: 10000). Does not limit the capture itself.
    pub signal_monitor_lifetime_ms: u64,

    /// Case-insensitive substrings identifying the preferred input device.
    pub preferred_device_hints: Vec<String>,

    /// Apply the preferred device when nothing is selected (default: true).
    pub auto_select_preferred: bool,
}

impl SessionConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.signal_poll_interval_ms == 0 {
            return Err("signal poll interval must be positive".into());
        }
        if self.signal_monitor_lifetime_ms < self.signal_poll_interval_ms {
            return Err(format!(
                "signal monitor lifetime ({}ms) is shorter than the poll interval ({}ms)",
                self.signal_monitor_lifetime_ms, self.signal_poll_interval_ms
            ));
        }
        if self.preferred_device_hints.iter().any(|h| h.trim().is_empty()) {
            return Err("preferred device hints must not be empty".into());
        }
        Ok(())
    }

    pub fn signal_poll_interval(&self) -> Duration {
        Duration::from_millis(self.signal_poll_interval_ms)
    }

    pub fn signal_monitor_lifetime(&self) -> Duration {
        Duration::from_millis(self.signal_monitor_lifetime_ms)
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SessionError::Configuration(format!("failed to parse: {}", e)))?;
        config.validate().map_err(SessionError::Configuration)?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let json = fs::read_to_string(path).map_err(|e| {
            SessionError::Configuration(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self {
            signal_poll_interval_ms: 1000,
            signal_monitor_lifetime_ms: 10_000,
            preferred_device_hints: vec!["karsect".into(), "upc".into()],
            auto_select_preferred: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SessionConfiguration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.signal_poll_interval(), Duration::from_secs(1));
        assert_eq!(config.signal_monitor_lifetime(), Duration::from_secs(10));
    }

    #[test]
    fn rejects_zero_interval() {
        let config = SessionConfiguration {
            signal_poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_lifetime_shorter_than_interval() {
        let config = SessionConfiguration {
            signal_poll_interval_ms: 2000,
            signal_monitor_lifetime_ms: 500,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("shorter"));
    }

    #[test]
    fn rejects_blank_hint() {
        let config = SessionConfiguration {
            preferred_device_hints: vec!["karsect".into(), "  ".into()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config = SessionConfiguration::from_json(r#"{ "signal_poll_interval_ms": 250 }"#).unwrap();
        assert_eq!(config.signal_poll_interval_ms, 250);
        assert_eq!(config.signal_monitor_lifetime_ms, 10_000);
        assert!(config.auto_select_preferred);
    }

    #[test]
    fn invalid_json_is_configuration_error() {
        let err = SessionConfiguration::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SessionError::Configuration(_)));

        let err = SessionConfiguration::from_json(r#"{ "signal_poll_interval_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, SessionError::Configuration(_)));
    }
}
