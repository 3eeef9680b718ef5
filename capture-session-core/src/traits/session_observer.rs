use crate::models::device::CaptureActivity;
use crate::models::error::SessionError;
use crate::models::state::CaptureStatus;

/// Event observer for capture session notifications.
///
/// Methods are called after the controller's state lock is released, from
/// whichever task drove the change (a caller of `start`/`stop`, or the
/// signal monitor). Implementations should marshal to the UI thread if needed.
pub trait SessionObserver: Send + Sync {
    /// Called when the effective "is capturing, and with which device" fact
    /// changes.
    fn on_capture_changed(&self, activity: &CaptureActivity);

    /// Called on every status transition.
    fn on_status_changed(&self, _status: CaptureStatus) {}

    /// Called with each applied signal check result.
    fn on_signal_status(&self, _message: &str) {}

    /// Called when a backend call fails or a request is rejected.
    fn on_error(&self, _error: &SessionError) {}
}
