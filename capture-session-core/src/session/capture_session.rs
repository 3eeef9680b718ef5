use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::device::{CaptureActivity, Device};
use crate::models::error::{BackendError, SessionError};
use crate::models::state::CaptureStatus;

/// Opaque token identifying one capture period.
///
/// A fresh generation is minted for every start request. Anything tagged
/// with an older generation (signal polls, late backend responses) is
/// ignored once the session has moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Generation(Uuid);

impl Generation {
    pub(crate) fn next() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to correlate log lines.
        write!(f, "{}", &self.0.simple().to_string()[..8])
    }
}

/// Identifies one outstanding backend start or stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    serial: u64,
    generation: Generation,
}

impl RequestTicket {
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// What the caller must send to the backend after `begin_start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub ticket: RequestTicket,
    pub device: Option<Device>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Session is now active; a signal monitor should be bound to `generation`.
    Activated { generation: Generation },
    /// Backend refused; session rolled back to idle.
    Rejected(SessionError),
    /// The request was invalidated before its response arrived.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Session is idle; the monitor bound to `generation` must be cancelled.
    Stopped { generation: Generation },
    /// Backend refused; session is still active.
    Rejected(SessionError),
    Stale,
}

/// Notifications produced by transitions, drained by the controller and
/// forwarded to the observer once the state lock is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    StatusChanged(CaptureStatus),
    CaptureChanged(CaptureActivity),
    SignalStatus(String),
    Error(SessionError),
}

/// The capture session state machine.
///
/// Pure state: performs no I/O and never awaits. The controller calls a
/// `begin_*` method, awaits the backend, then feeds the response back through
/// the matching `complete_*` method with the ticket it was given.
#[derive(Debug)]
pub struct CaptureSession {
    status: CaptureStatus,
    selected_device: Option<Device>,
    status_message: Option<String>,
    error_message: Option<String>,
    signal_status: Option<String>,
    generation: Option<Generation>,
    pending: Option<RequestTicket>,
    next_serial: u64,
    capture_started_at: Option<DateTime<Utc>>,
    last_signal_check_at: Option<DateTime<Utc>>,
    events: Vec<SessionEvent>,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            status: CaptureStatus::Idle,
            selected_device: None,
            status_message: None,
            error_message: None,
            signal_status: None,
            generation: None,
            pending: None,
            next_serial: 0,
            capture_started_at: None,
            last_signal_check_at: None,
            events: Vec::new(),
        }
    }

    pub fn status(&self) -> CaptureStatus {
        self.status
    }

    pub fn selected_device(&self) -> Option<&Device> {
        self.selected_device.as_ref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn signal_status(&self) -> Option<&str> {
        self.signal_status.as_deref()
    }

    pub fn generation(&self) -> Option<Generation> {
        self.generation
    }

    pub fn capture_started_at(&self) -> Option<DateTime<Utc>> {
        self.capture_started_at
    }

    pub fn last_signal_check_at(&self) -> Option<DateTime<Utc>> {
        self.last_signal_check_at
    }

    pub fn activity(&self) -> CaptureActivity {
        if self.status.is_capturing() {
            CaptureActivity::Capturing {
                device: self.selected_device.clone(),
            }
        } else {
            CaptureActivity::Inactive
        }
    }

    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Change the device used by the next start. Ignored unless idle.
    pub fn select_device(&mut self, device: Option<Device>) -> bool {
        if !self.status.is_idle() {
            log::debug!("Ignoring device selection while {}", self.status);
            return false;
        }
        self.selected_device = device;
        true
    }

    /// Auto-apply a detected preferred device when nothing is selected yet.
    pub fn apply_preferred(&mut self, preferred: &Device) -> bool {
        if self.selected_device.is_some() || !self.select_device(Some(preferred.clone())) {
            return false;
        }
        self.status_message = Some(format!("preferred device detected: {}", preferred));
        true
    }

    /// Idle → starting. Mints the generation for the new capture period.
    pub fn begin_start(&mut self, devices_available: bool) -> Result<StartRequest, SessionError> {
        if !self.status.is_idle() {
            return Err(SessionError::invalid_state("start", self.status));
        }
        if !devices_available {
            return Err(SessionError::NoDevicesAvailable);
        }

        let generation = Generation::next();
        let ticket = self.issue_ticket(generation);
        self.generation = Some(generation);
        self.error_message = None;
        self.set_status(CaptureStatus::Starting);
        log::debug!("Starting capture on {:?} (generation {})", self.selected_device, generation);

        Ok(StartRequest {
            ticket,
            device: self.selected_device.clone(),
        })
    }

    /// Apply the backend's answer to a start request.
    pub fn complete_start(
        &mut self,
        ticket: RequestTicket,
        result: Result<String, BackendError>,
    ) -> StartOutcome {
        if !self.claim(ticket, CaptureStatus::Starting) {
            log::warn!(
                "Discarding start response for generation {} (session is {})",
                ticket.generation,
                self.status
            );
            return StartOutcome::Stale;
        }

        match result {
            Ok(message) => {
                self.status_message = Some(message);
                self.error_message = None;
                self.signal_status = None;
                self.capture_started_at = Some(Utc::now());
                self.set_status(CaptureStatus::Active);
                self.events.push(SessionEvent::CaptureChanged(self.activity()));
                StartOutcome::Activated {
                    generation: ticket.generation,
                }
            }
            Err(e) => {
                let err = SessionError::StartFailed(e.to_string());
                self.generation = None;
                self.record_error(err.clone());
                self.set_status(CaptureStatus::Idle);
                StartOutcome::Rejected(err)
            }
        }
    }

    /// Active → stopping.
    pub fn begin_stop(&mut self) -> Result<RequestTicket, SessionError> {
        let generation = match (self.status, self.generation) {
            (CaptureStatus::Active, Some(generation)) => generation,
            _ => return Err(SessionError::invalid_state("stop", self.status)),
        };

        let ticket = self.issue_ticket(generation);
        self.set_status(CaptureStatus::Stopping);
        Ok(ticket)
    }

    /// Apply the backend's answer to a stop request.
    pub fn complete_stop(
        &mut self,
        ticket: RequestTicket,
        result: Result<String, BackendError>,
    ) -> StopOutcome {
        if !self.claim(ticket, CaptureStatus::Stopping) {
            log::warn!(
                "Discarding stop response for generation {} (session is {})",
                ticket.generation,
                self.status
            );
            return StopOutcome::Stale;
        }

        match result {
            Ok(message) => {
                self.status_message = Some(message);
                self.error_message = None;
                self.end_capture_period();
                self.set_status(CaptureStatus::Idle);
                self.events.push(SessionEvent::CaptureChanged(CaptureActivity::Inactive));
                StopOutcome::Stopped {
                    generation: ticket.generation,
                }
            }
            Err(e) => {
                let err = SessionError::StopFailed(e.to_string());
                self.record_error(err.clone());
                self.set_status(CaptureStatus::Active);
                StopOutcome::Rejected(err)
            }
        }
    }

    /// Record a signal check result. Returns false for stale generations.
    ///
    /// Only display fields are touched; a failing probe does not mean the
    /// capture itself is broken.
    pub fn apply_signal(
        &mut self,
        generation: Generation,
        result: Result<String, BackendError>,
    ) -> bool {
        if self.generation != Some(generation) || !self.status.is_capturing() {
            return false;
        }

        let message = match result {
            Ok(message) => message,
            Err(e) => {
                log::warn!("Signal check failed: {}", e);
                SessionError::SignalCheckFailed(e.to_string()).to_string()
            }
        };
        self.last_signal_check_at = Some(Utc::now());
        self.signal_status = Some(message.clone());
        self.events.push(SessionEvent::SignalStatus(message));
        true
    }

    /// Force the session into `Failed`, e.g. when the backend stream dies.
    ///
    /// Returns the generation that was running so its monitor can be
    /// cancelled.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<Option<Generation>, SessionError> {
        if self.status.is_idle() || self.status == CaptureStatus::Failed {
            return Err(SessionError::invalid_state("report a capture failure", self.status));
        }

        let was_capturing = self.status.is_capturing();
        let generation = self.generation;
        self.end_capture_period();
        self.record_error(SessionError::CaptureFailed(reason.into()));
        self.set_status(CaptureStatus::Failed);
        if was_capturing {
            self.events.push(SessionEvent::CaptureChanged(CaptureActivity::Inactive));
        }
        Ok(generation)
    }

    /// Failed → idle.
    pub fn acknowledge_failure(&mut self) -> Result<(), SessionError> {
        if self.status != CaptureStatus::Failed {
            return Err(SessionError::invalid_state("acknowledge a failure", self.status));
        }
        self.error_message = None;
        self.set_status(CaptureStatus::Idle);
        Ok(())
    }

    // --- Internal helpers ---

    fn issue_ticket(&mut self, generation: Generation) -> RequestTicket {
        self.next_serial += 1;
        let ticket = RequestTicket {
            serial: self.next_serial,
            generation,
        };
        self.pending = Some(ticket);
        ticket
    }

    /// Consume the pending ticket if `ticket` is it and the session is
    /// still waiting in `expected`.
    fn claim(&mut self, ticket: RequestTicket, expected: CaptureStatus) -> bool {
        if self.pending != Some(ticket) || self.status != expected {
            return false;
        }
        self.pending = None;
        true
    }

    fn end_capture_period(&mut self) {
        self.generation = None;
        self.pending = None;
        self.signal_status = None;
        self.capture_started_at = None;
        self.last_signal_check_at = None;
    }

    fn record_error(&mut self, error: SessionError) {
        self.error_message = Some(error.to_string());
        self.events.push(SessionEvent::Error(error));
    }

    fn set_status(&mut self, status: CaptureStatus) {
        if self.status == status {
            return;
        }
        log::debug!("Capture status {} -> {}", self.status, status);
        self.status = status;
        self.events.push(SessionEvent::StatusChanged(status));
    }
}
