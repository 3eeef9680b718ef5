use async_trait::async_trait;

use crate::models::error::BackendError;

/// Boundary to the external audio subsystem.
///
/// Implemented by whatever owns the real device streams (a cpal host, a
/// sidecar process, a test double). Every operation may fail; the controller
/// handles both outcomes at each call site and never retries on its own.
///
/// Calls are not timed out by the controller. Implementations are trusted to
/// eventually resolve or reject.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Names of the available input devices, in display order.
    async fn enumerate_devices(&self) -> Result<Vec<String>, BackendError>;

    /// Begin capturing from `device`, or from the backend's default input
    /// when `None`. Returns a human-readable status line.
    async fn start_capture(&self, device: Option<String>) -> Result<String, BackendError>;

    /// Stop the running capture. Returns a human-readable status line.
    async fn stop_capture(&self) -> Result<String, BackendError>;

    /// Describe whether signal is arriving on the running capture.
    async fn check_signal(&self) -> Result<String, BackendError>;
}
