use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::catalog::device_catalog::DeviceCatalog;
use crate::models::config::SessionConfiguration;
use crate::models::device::{CaptureActivity, Device};
use crate::models::error::{BackendError, SessionError};
use crate::models::snapshot::SessionSnapshot;
use crate::models::state::CaptureStatus;
use crate::monitor::signal_monitor::{MonitorHandle, SignalCallback, SignalMonitor};
use crate::session::capture_session::{
    CaptureSession, Generation, SessionEvent, StartOutcome, StopOutcome,
};
use crate::traits::backend_gateway::BackendGateway;
use crate::traits::session_observer::SessionObserver;

/// Internal mutable state, protected by `parking_lot::Mutex`.
///
/// The lock is never held across an `.await`. Every backend response is
/// applied in one critical section together with its side effects on the
/// monitor, so a stop and the monitor cancellation it implies are atomic.
struct ControllerState {
    catalog: DeviceCatalog,
    session: CaptureSession,
    monitor: Option<MonitorHandle>,
}

struct Shared {
    gateway: Arc<dyn BackendGateway>,
    config: SessionConfiguration,
    signal_monitor: SignalMonitor,
    state: Mutex<ControllerState>,
    observer: Mutex<Option<Arc<dyn SessionObserver>>>,
}

/// Capture session lifecycle controller.
///
/// Owns the device catalog, the session state machine and the signal
/// monitor, and drives them against a `BackendGateway`:
/// ```text
/// refresh_devices ─→ [DeviceCatalog] ─→ preferred device ─→ [CaptureSession]
/// start ─→ gateway.start_capture ─→ Active ─→ [SignalMonitor] ─→ gateway.check_signal
/// stop  ─→ gateway.stop_capture  ─→ Idle (monitor cancelled)
/// ```
///
/// Cheap to clone; clones share one session. Operations take `&self` so a
/// refresh or a stop can run while another call is waiting on the backend.
#[derive(Clone)]
pub struct CaptureController {
    shared: Arc<Shared>,
}

impl CaptureController {
    pub fn new(
        gateway: Arc<dyn BackendGateway>,
        config: SessionConfiguration,
    ) -> Result<Self, SessionError> {
        config.validate().map_err(SessionError::Configuration)?;

        let state = ControllerState {
            catalog: DeviceCatalog::new(config.preferred_device_hints.clone()),
            session: CaptureSession::new(),
            monitor: None,
        };

        Ok(Self {
            shared: Arc::new(Shared {
                gateway,
                signal_monitor: SignalMonitor::from_configuration(&config),
                config,
                state: Mutex::new(state),
                observer: Mutex::new(None),
            }),
        })
    }

    pub fn set_observer(&self, observer: Arc<dyn SessionObserver>) {
        *self.shared.observer.lock() = Some(observer);
    }

    pub fn configuration(&self) -> &SessionConfiguration {
        &self.shared.config
    }

    /// Initial device load, run once when the host starts.
    pub async fn initialize(&self) -> Result<(), SessionError> {
        log::info!("Initializing capture controller");
        self.refresh_devices().await
    }

    /// Re-enumerate input devices.
    ///
    /// On success the preferred device is applied to the session if nothing
    /// is selected yet. On failure the previous list is kept and the session
    /// is untouched.
    pub async fn refresh_devices(&self) -> Result<(), SessionError> {
        let result = self.shared.gateway.enumerate_devices().await;

        let (outcome, events) = {
            let mut state = self.shared.state.lock();
            let outcome = state.catalog.apply_enumeration(result);

            if outcome.is_ok() && self.shared.config.auto_select_preferred {
                if let Some(preferred) = state.catalog.preferred_device().cloned() {
                    if state.session.apply_preferred(&preferred) {
                        log::info!("Auto-selected preferred device '{}'", preferred);
                    }
                }
            }
            (outcome, state.session.take_events())
        };

        self.dispatch(events);
        if let Err(ref e) = outcome {
            self.notify_error(e);
        }
        outcome
    }

    /// Choose the device for the next capture (`None` = backend default).
    ///
    /// Ignored unless the session is idle. Returns whether it was applied.
    pub fn set_selected_device(&self, device: Option<Device>) -> bool {
        self.shared.state.lock().session.select_device(device)
    }

    /// Start capturing from the selected device.
    ///
    /// Rejected without contacting the backend when the device list is empty
    /// or the session is not idle. On success a signal monitor is bound to
    /// the new capture period.
    pub async fn start(&self) -> Result<(), SessionError> {
        let (request, events) = {
            let mut state = self.shared.state.lock();
            let devices_available = !state.catalog.is_empty();
            let request = state.session.begin_start(devices_available);
            (request, state.session.take_events())
        };
        self.dispatch(events);

        let request = match request {
            Ok(request) => request,
            Err(e) => {
                log::warn!("Start rejected: {}", e);
                self.notify_error(&e);
                return Err(e);
            }
        };

        log::info!("Starting capture on {}", describe(request.device.as_ref()));
        let result = self
            .shared
            .gateway
            .start_capture(request.device.as_ref().map(|d| d.name().to_string()))
            .await;

        let (outcome, events) = {
            let mut state = self.shared.state.lock();
            let outcome = state.session.complete_start(request.ticket, result);

            if let StartOutcome::Activated { generation } = outcome {
                let handle = self.shared.signal_monitor.spawn(
                    generation,
                    Arc::clone(&self.shared.gateway),
                    self.signal_callback(),
                );
                if let Some(previous) = state.monitor.replace(handle) {
                    previous.cancel();
                }
            }
            (outcome, state.session.take_events())
        };
        self.dispatch(events);

        match outcome {
            StartOutcome::Activated { generation } => {
                log::info!("Capture active (generation {})", generation);
                Ok(())
            }
            StartOutcome::Rejected(e) => {
                log::warn!("{}", e);
                Err(e)
            }
            StartOutcome::Stale => Err(SessionError::Superseded { operation: "start" }),
        }
    }

    /// Stop the running capture.
    ///
    /// The signal monitor is cancelled in the same critical section that
    /// moves the session to idle. If the backend refuses, the session stays
    /// active and the monitor keeps running.
    pub async fn stop(&self) -> Result<(), SessionError> {
        let (ticket, events) = {
            let mut state = self.shared.state.lock();
            let ticket = state.session.begin_stop();
            (ticket, state.session.take_events())
        };
        self.dispatch(events);

        let ticket = match ticket {
            Ok(ticket) => ticket,
            Err(e) => {
                log::warn!("Stop rejected: {}", e);
                self.notify_error(&e);
                return Err(e);
            }
        };

        log::info!("Stopping capture (generation {})", ticket.generation());
        let result = self.shared.gateway.stop_capture().await;

        let (outcome, events) = {
            let mut state = self.shared.state.lock();
            let outcome = state.session.complete_stop(ticket, result);

            if let StopOutcome::Stopped { .. } = outcome {
                if let Some(monitor) = state.monitor.take() {
                    monitor.cancel();
                }
            }
            (outcome, state.session.take_events())
        };
        self.dispatch(events);

        match outcome {
            StopOutcome::Stopped { generation } => {
                log::info!("Capture stopped (generation {})", generation);
                Ok(())
            }
            StopOutcome::Rejected(e) => {
                log::warn!("{}", e);
                Err(e)
            }
            StopOutcome::Stale => Err(SessionError::Superseded { operation: "stop" }),
        }
    }

    /// Move the session to `Failed` after the backend reports that the
    /// capture died on its own (stream error, device unplugged).
    pub fn report_capture_failure(&self, reason: impl Into<String>) -> Result<(), SessionError> {
        let reason = reason.into();
        let events = {
            let mut state = self.shared.state.lock();
            state.session.fail(reason.clone())?;
            if let Some(monitor) = state.monitor.take() {
                monitor.cancel();
            }
            state.session.take_events()
        };
        log::error!("Capture failed: {}", reason);
        self.dispatch(events);
        Ok(())
    }

    /// Clear a failure so a new capture can be started.
    pub fn acknowledge_failure(&self) -> Result<(), SessionError> {
        let events = {
            let mut state = self.shared.state.lock();
            state.session.acknowledge_failure()?;
            state.session.take_events()
        };
        self.dispatch(events);
        Ok(())
    }

    pub fn status(&self) -> CaptureStatus {
        self.shared.state.lock().session.status()
    }

    /// The running capture and its device, if any.
    pub fn current_capture(&self) -> CaptureActivity {
        self.shared.state.lock().session.activity()
    }

    pub fn is_monitoring(&self) -> bool {
        self.shared
            .state
            .lock()
            .monitor
            .as_ref()
            .is_some_and(|m| m.is_running())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.shared.state.lock();
        let session = &state.session;
        SessionSnapshot {
            status: session.status(),
            selected_device: session.selected_device().cloned(),
            status_message: session.status_message().map(str::to_string),
            error_message: session.error_message().map(str::to_string),
            signal_status: session.signal_status().map(str::to_string),
            devices: state.catalog.devices().to_vec(),
            preferred_device: state.catalog.preferred_device().cloned(),
            enumeration_error: state.catalog.last_error().map(|e| e.to_string()),
            monitoring: state.monitor.as_ref().is_some_and(|m| m.is_running()),
            capture_started_at: session.capture_started_at(),
            last_signal_check_at: session.last_signal_check_at(),
        }
    }

    // --- Internal helpers ---

    fn signal_callback(&self) -> SignalCallback {
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        Arc::new(move |generation, result| {
            if let Some(shared) = shared.upgrade() {
                CaptureController { shared }.apply_signal(generation, result);
            }
        })
    }

    fn apply_signal(&self, generation: Generation, result: Result<String, BackendError>) {
        let events = {
            let mut state = self.shared.state.lock();
            if !state.session.apply_signal(generation, result) {
                log::debug!("Dropping signal result for stale generation {}", generation);
                return;
            }
            state.session.take_events()
        };
        self.dispatch(events);
    }

    fn observer(&self) -> Option<Arc<dyn SessionObserver>> {
        self.shared.observer.lock().clone()
    }

    fn dispatch(&self, events: Vec<SessionEvent>) {
        if events.is_empty() {
            return;
        }
        let Some(observer) = self.observer() else {
            return;
        };
        for event in events {
            match event {
                SessionEvent::StatusChanged(status) => observer.on_status_changed(status),
                SessionEvent::CaptureChanged(activity) => observer.on_capture_changed(&activity),
                SessionEvent::SignalStatus(message) => observer.on_signal_status(&message),
                SessionEvent::Error(error) => observer.on_error(&error),
            }
        }
    }

    fn notify_error(&self, error: &SessionError) {
        if let Some(observer) = self.observer() {
            observer.on_error(error);
        }
    }
}

fn describe(device: Option<&Device>) -> &str {
    device.map_or("default device", |d| d.name())
}
