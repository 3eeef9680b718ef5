use crate::models::device::Device;
use crate::models::error::{BackendError, SessionError};

/// Most recent device enumeration plus the auto-detected preferred device.
///
/// Replaced wholesale on every successful enumeration. A failed
/// enumeration keeps the previous list so the operator can still pick from
/// stale data.
#[derive(Debug, Clone, Default)]
pub struct DeviceCatalog {
    devices: Vec<Device>,
    preferred: Option<Device>,
    last_error: Option<SessionError>,
    hints: Vec<String>,
}

impl DeviceCatalog {
    pub fn new(hints: Vec<String>) -> Self {
        Self {
            hints,
            ..Default::default()
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn preferred_device(&self) -> Option<&Device> {
        self.preferred.as_ref()
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub fn contains(&self, device: &Device) -> bool {
        self.devices.contains(device)
    }

    /// Fold one enumeration outcome into the catalog.
    ///
    /// Returns the error recorded for a failed enumeration.
    pub fn apply_enumeration(
        &mut self,
        result: Result<Vec<String>, BackendError>,
    ) -> Result<(), SessionError> {
        match result {
            Ok(names) => {
                self.devices = names.into_iter().map(Device::from).collect();
                self.preferred = find_preferred(&self.devices, &self.hints).cloned();
                self.last_error = None;
                log::debug!(
                    "Device catalog refreshed: {} device(s), preferred {:?}",
                    self.devices.len(),
                    self.preferred
                );
                Ok(())
            }
            Err(e) => {
                let err = SessionError::EnumerationFailed(e.to_string());
                log::warn!("Device enumeration failed, keeping {} cached device(s): {}", self.devices.len(), e);
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }
}

/// First device, in catalog order, whose name contains any hint token.
pub fn find_preferred<'a>(devices: &'a [Device], hints: &[String]) -> Option<&'a Device> {
    devices
        .iter()
        .find(|device| hints.iter().any(|hint| device.matches_hint(hint)))
}
