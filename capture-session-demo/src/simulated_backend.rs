use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use capture_session_core::{BackendError, BackendGateway};

/// Buffer length the simulated stream delivers (~46ms at 44.1kHz).
const BUFFER_DURATION: Duration = Duration::from_millis(46);

/// Simulated latency of every backend command.
const COMMAND_LATENCY: Duration = Duration::from_millis(120);

struct RunningCapture {
    device: String,
    started_at: Instant,
    buffers_reported: u64,
}

/// In-process stand-in for an audio host.
///
/// **NOT A REAL BACKEND**: pretends to stream fixed-size buffers from the
/// chosen device so the controller can be exercised without hardware.
pub struct SimulatedBackend {
    devices: Vec<String>,
    default_device: Option<String>,
    capture: Mutex<Option<RunningCapture>>,
}

impl SimulatedBackend {
    pub fn new(devices: Vec<String>) -> Self {
        let default_device = devices.first().cloned();
        Self {
            devices,
            default_device,
            capture: Mutex::new(None),
        }
    }

    fn resolve(&self, requested: Option<&str>) -> Result<String, BackendError> {
        match requested {
            Some(name) => self
                .devices
                .iter()
                .find(|d| d.as_str() == name)
                .cloned()
                .ok_or_else(|| BackendError::DeviceNotFound(name.to_string())),
            None => self
                .default_device
                .clone()
                .ok_or_else(|| BackendError::BackendUnavailable("no default input device".into())),
        }
    }
}

#[async_trait]
impl BackendGateway for SimulatedBackend {
    async fn enumerate_devices(&self) -> Result<Vec<String>, BackendError> {
        tokio::time::sleep(COMMAND_LATENCY).await;
        Ok(self.devices.clone())
    }

    async fn start_capture(&self, device: Option<String>) -> Result<String, BackendError> {
        tokio::time::sleep(COMMAND_LATENCY).await;
        let device = self.resolve(device.as_deref())?;

        let mut capture = self.capture.lock();
        if let Some(ref running) = *capture {
            return Err(BackendError::DeviceBusy(running.device.clone()));
        }
        *capture = Some(RunningCapture {
            device: device.clone(),
            started_at: Instant::now(),
            buffers_reported: 0,
        });
        log::debug!("Simulated stream opened on '{}'", device);
        Ok(format!("capture started: {}", device))
    }

    async fn stop_capture(&self) -> Result<String, BackendError> {
        tokio::time::sleep(COMMAND_LATENCY).await;
        match self.capture.lock().take() {
            Some(running) => Ok(format!("capture stopped: {}", running.device)),
            None => Err(BackendError::NotCapturing),
        }
    }

    async fn check_signal(&self) -> Result<String, BackendError> {
        let mut capture = self.capture.lock();
        let running = capture.as_mut().ok_or(BackendError::NotCapturing)?;

        // Buffers delivered since the previous check
        let total = (running.started_at.elapsed().as_millis() / BUFFER_DURATION.as_millis()) as u64;
        let fresh = total - running.buffers_reported;
        running.buffers_reported = total;

        if fresh > 0 {
            Ok(format!("signal OK ({} buffers)", fresh))
        } else {
            Ok("no buffers received yet".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> SimulatedBackend {
        SimulatedBackend::new(vec!["Built-in Microphone".into(), "Karsect UPC-X".into()])
    }

    #[tokio::test(start_paused = true)]
    async fn start_resolves_default_device() {
        let backend = backend();
        let message = backend.start_capture(None).await.unwrap();
        assert_eq!(message, "capture started: Built-in Microphone");
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_device_is_not_found() {
        let err = backend().start_capture(Some("Nope".into())).await.unwrap_err();
        assert_eq!(err, BackendError::DeviceNotFound("Nope".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_reports_busy() {
        let backend = backend();
        backend.start_capture(Some("Karsect UPC-X".into())).await.unwrap();
        let err = backend.start_capture(None).await.unwrap_err();
        assert_eq!(err, BackendError::DeviceBusy("Karsect UPC-X".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn signal_counts_fresh_buffers() {
        let backend = backend();
        assert_eq!(backend.check_signal().await, Err(BackendError::NotCapturing));

        backend.start_capture(None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(460)).await;
        assert_eq!(backend.check_signal().await.unwrap(), "signal OK (10 buffers)");
        assert_eq!(backend.check_signal().await.unwrap(), "no buffers received yet");

        backend.stop_capture().await.unwrap();
        assert_eq!(backend.stop_capture().await, Err(BackendError::NotCapturing));
    }
}
