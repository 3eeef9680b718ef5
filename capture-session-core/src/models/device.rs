use std::fmt;

use serde::{Deserialize, Serialize};

/// A named audio input endpoint as reported by the backend.
///
/// Devices have no identity beyond their name. Two enumerations that return
/// the same string refer to the same device; matching is exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Device(String);

impl Device {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Case-insensitive substring match against a hint token.
    pub fn matches_hint(&self, hint: &str) -> bool {
        !hint.is_empty() && self.0.to_lowercase().contains(&hint.to_lowercase())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Device {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&str> for Device {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// The effective "is capturing, and with which device" fact exposed upward.
///
/// `Capturing { device: None }` means the backend's default input device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum CaptureActivity {
    Inactive,
    Capturing { device: Option<Device> },
}

impl CaptureActivity {
    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing { .. })
    }

    pub fn device(&self) -> Option<&Device> {
        match self {
            Self::Capturing { device } => device.as_ref(),
            Self::Inactive => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_match_ignores_case() {
        let device = Device::new("Karsect UPC-X");
        assert!(device.matches_hint("karsect"));
        assert!(device.matches_hint("UPC"));
        assert!(!device.matches_hint("focusrite"));
    }

    #[test]
    fn empty_hint_never_matches() {
        assert!(!Device::new("Generic Mic").matches_hint(""));
    }

    #[test]
    fn activity_serializes_with_tag() {
        let active = CaptureActivity::Capturing {
            device: Some(Device::new("Line In")),
        };
        let json = serde_json::to_value(&active).unwrap();
        assert_eq!(json["state"], "capturing");
        assert_eq!(json["device"], "Line In");

        let json = serde_json::to_value(CaptureActivity::Inactive).unwrap();
        assert_eq!(json["state"], "inactive");
    }
}
