use chrono::{DateTime, Utc};
use serde::Serialize;

use super::device::Device;
use super::state::CaptureStatus;

/// Point-in-time view of the controller for the presentation layer.
///
/// The UI renders this instead of keeping its own copies of
/// "selected device" or "is capturing".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: CaptureStatus,
    pub selected_device: Option<Device>,
    pub status_message: Option<String>,
    pub error_message: Option<String>,
    pub signal_status: Option<String>,
    pub devices: Vec<Device>,
    pub preferred_device: Option<Device>,
    pub enumeration_error: Option<String>,
    pub monitoring: bool,
    pub capture_started_at: Option<DateTime<Utc>>,
    pub last_signal_check_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// Starting a capture is possible from this snapshot.
    pub fn can_start(&self) -> bool {
        self.status.is_idle() && !self.devices.is_empty()
    }

    /// Device selection is editable.
    pub fn selection_enabled(&self) -> bool {
        self.status.is_idle()
    }
}
