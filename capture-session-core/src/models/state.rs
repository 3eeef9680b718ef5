use std::fmt;

use serde::Serialize;

/// Capture session state machine.
///
/// State transitions:
/// ```text
///          start()            backend ok
/// idle ─────────────→ starting ─────────→ active
///  ↑  ←──────────────────┘  backend err     │  ↑
///  │                                 stop() │  │ backend err
///  │         backend ok                     ↓  │
///  └──────────────────────────────────── stopping
///
/// starting / active / stopping ── failure reported ──→ failed ── acknowledge ──→ idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureStatus {
    Idle,
    Starting,
    Active,
    Stopping,
    Failed,
}

impl CaptureStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// A backend request is outstanding.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Starting | Self::Stopping)
    }

    /// The backend is (or is believed to be) delivering audio.
    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Active | Self::Stopping)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Active => "active",
            Self::Stopping => "stopping",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capturing_covers_stopping() {
        assert!(CaptureStatus::Active.is_capturing());
        assert!(CaptureStatus::Stopping.is_capturing());
        assert!(!CaptureStatus::Starting.is_capturing());
        assert!(!CaptureStatus::Failed.is_capturing());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&CaptureStatus::Stopping).unwrap();
        assert_eq!(json, "\"stopping\"");
    }
}
