//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::models::device::CaptureActivity;
use crate::models::error::{BackendError, SessionError};
use crate::models::state::CaptureStatus;
use crate::session::capture_session::Generation;
use crate::traits::backend_gateway::BackendGateway;
use crate::traits::session_observer::SessionObserver;

pub(crate) fn generation() -> Generation {
    Generation::next()
}

/// Gateway answering from queued scripts, falling back to success.
///
/// Start and stop calls can be held open with a gate to reproduce responses
/// arriving out of order.
pub(crate) struct ScriptedGateway {
    devices: Mutex<Result<Vec<String>, BackendError>>,
    start_results: Mutex<VecDeque<Result<String, BackendError>>>,
    stop_results: Mutex<VecDeque<Result<String, BackendError>>>,
    signal_results: Mutex<VecDeque<Result<String, BackendError>>>,
    start_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    stop_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    signal_latency: Mutex<Duration>,
    start_calls: Mutex<Vec<Option<String>>>,
    enumerate_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    signal_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Arc<Self> {
        Self::with_devices(&["Generic Mic", "Karsect UPC-X"])
    }

    pub(crate) fn with_devices(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            devices: Mutex::new(Ok(names.iter().map(|n| n.to_string()).collect())),
            start_results: Mutex::new(VecDeque::new()),
            stop_results: Mutex::new(VecDeque::new()),
            signal_results: Mutex::new(VecDeque::new()),
            start_gates: Mutex::new(VecDeque::new()),
            stop_gates: Mutex::new(VecDeque::new()),
            signal_latency: Mutex::new(Duration::ZERO),
            start_calls: Mutex::new(Vec::new()),
            enumerate_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            signal_calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn set_devices(&self, devices: Result<Vec<String>, BackendError>) {
        *self.devices.lock() = devices;
    }

    pub(crate) fn push_start(&self, result: Result<String, BackendError>) {
        self.start_results.lock().push_back(result);
    }

    pub(crate) fn push_stop(&self, result: Result<String, BackendError>) {
        self.stop_results.lock().push_back(result);
    }

    pub(crate) fn push_signal(&self, result: Result<String, BackendError>) {
        self.signal_results.lock().push_back(result);
    }

    /// Hold the next start call open until the returned sender fires.
    pub(crate) fn gate_next_start(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.start_gates.lock().push_back(rx);
        tx
    }

    /// Hold the next stop call open until the returned sender fires.
    pub(crate) fn gate_next_stop(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.stop_gates.lock().push_back(rx);
        tx
    }

    pub(crate) fn set_signal_latency(&self, latency: Duration) {
        *self.signal_latency.lock() = latency;
    }

    pub(crate) fn start_calls(&self) -> Vec<Option<String>> {
        self.start_calls.lock().clone()
    }

    pub(crate) fn enumerate_calls(&self) -> usize {
        self.enumerate_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn signal_calls(&self) -> usize {
        self.signal_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendGateway for ScriptedGateway {
    async fn enumerate_devices(&self) -> Result<Vec<String>, BackendError> {
        self.enumerate_calls.fetch_add(1, Ordering::SeqCst);
        self.devices.lock().clone()
    }

    async fn start_capture(&self, device: Option<String>) -> Result<String, BackendError> {
        self.start_calls.lock().push(device.clone());
        let gate = self.start_gates.lock().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let scripted = self.start_results.lock().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(format!(
                "capture started: {}",
                device.as_deref().unwrap_or("default device")
            ))
        })
    }

    async fn stop_capture(&self) -> Result<String, BackendError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.stop_gates.lock().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let scripted = self.stop_results.lock().pop_front();
        scripted.unwrap_or_else(|| Ok("capture stopped".to_string()))
    }

    async fn check_signal(&self) -> Result<String, BackendError> {
        self.signal_calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self.signal_latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let scripted = self.signal_results.lock().pop_front();
        scripted.unwrap_or_else(|| Ok("signal ok".to_string()))
    }
}

/// Everything an observer was told, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Observed {
    Capture(CaptureActivity),
    Status(CaptureStatus),
    Signal(String),
    Error(SessionError),
}

#[derive(Default)]
pub(crate) struct RecordingObserver {
    events: Mutex<Vec<Observed>>,
}

impl RecordingObserver {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn events(&self) -> Vec<Observed> {
        self.events.lock().clone()
    }

    pub(crate) fn capture_changes(&self) -> Vec<CaptureActivity> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Observed::Capture(activity) => Some(activity.clone()),
                _ => None,
            })
            .collect()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_capture_changed(&self, activity: &CaptureActivity) {
        self.events.lock().push(Observed::Capture(activity.clone()));
    }

    fn on_status_changed(&self, status: CaptureStatus) {
        self.events.lock().push(Observed::Status(status));
    }

    fn on_signal_status(&self, message: &str) {
        self.events.lock().push(Observed::Signal(message.to_string()));
    }

    fn on_error(&self, error: &SessionError) {
        self.events.lock().push(Observed::Error(error.clone()));
    }
}
