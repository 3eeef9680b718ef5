use thiserror::Error;

use super::state::CaptureStatus;

/// Labeled failures returned by a `BackendGateway`.
///
/// The session never branches on the variant; only the rendered message
/// reaches status and error fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("device busy: {0}")]
    DeviceBusy(String),

    #[error("not capturing")]
    NotCapturing,

    #[error("audio backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// Errors surfaced by the capture session controller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("failed to list devices: {0}")]
    EnumerationFailed(String),

    #[error("failed to start capture: {0}")]
    StartFailed(String),

    #[error("failed to stop capture: {0}")]
    StopFailed(String),

    #[error("signal check failed: {0}")]
    SignalCheckFailed(String),

    #[error("no input devices available")]
    NoDevicesAvailable,

    #[error("cannot {operation} while {status}")]
    InvalidState {
        operation: &'static str,
        status: CaptureStatus,
    },

    #[error("{operation} request superseded before the backend answered")]
    Superseded { operation: &'static str },

    #[error("capture failed: {0}")]
    CaptureFailed(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl SessionError {
    pub(crate) fn invalid_state(operation: &'static str, status: CaptureStatus) -> Self {
        Self::InvalidState { operation, status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_backend_text() {
        let backend = BackendError::DeviceBusy("Karsect UPC-X".into());
        let err = SessionError::StartFailed(backend.to_string());
        assert_eq!(
            err.to_string(),
            "failed to start capture: device busy: Karsect UPC-X"
        );
    }

    #[test]
    fn invalid_state_names_operation() {
        let err = SessionError::invalid_state("start", CaptureStatus::Active);
        assert_eq!(err.to_string(), "cannot start while active");
    }
}
