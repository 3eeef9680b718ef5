//! # capture-session-core
//!
//! Capture session lifecycle controller.
//!
//! Manages input device discovery and auto-selection, the start/stop state
//! machine of a live capture, and a time-bounded background signal check.
//! The actual audio I/O lives behind the `BackendGateway` trait; hosts plug
//! in their backend and read `SessionSnapshot`s for display.
//!
//! ## Architecture
//!
//! ```text
//! capture-session-core (this crate)
//! ├── traits/       ← BackendGateway, SessionObserver
//! ├── models/       ← Device, CaptureStatus, SessionError, SessionConfiguration, SessionSnapshot
//! ├── catalog/      ← DeviceCatalog (enumeration result + preferred device)
//! ├── session/      ← CaptureSession (state machine), CaptureController (orchestrator)
//! └── monitor/      ← SignalMonitor (interval polling bounded by a lifetime)
//! ```
//!
//! ## Usage
//! ```ignore
//! use capture_session_core::{CaptureController, SessionConfiguration};
//!
//! let controller = CaptureController::new(backend, SessionConfiguration::default())?;
//! controller.initialize().await?;
//! controller.start().await?;
//! println!("{:?}", controller.snapshot().signal_status);
//! controller.stop().await?;
//! ```

pub mod catalog;
pub mod models;
pub mod monitor;
pub mod session;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types at crate root for convenience.
pub use catalog::device_catalog::{find_preferred, DeviceCatalog};
pub use models::config::SessionConfiguration;
pub use models::device::{CaptureActivity, Device};
pub use models::error::{BackendError, SessionError};
pub use models::snapshot::SessionSnapshot;
pub use models::state::CaptureStatus;
pub use monitor::signal_monitor::{MonitorHandle, SignalCallback, SignalMonitor};
pub use session::capture_session::{CaptureSession, Generation, RequestTicket};
pub use session::controller::CaptureController;
pub use traits::backend_gateway::BackendGateway;
pub use traits::session_observer::SessionObserver;
