use serde::Serialize;

use capture_session_core::{CaptureActivity, CaptureStatus, SessionError, SessionObserver};

/// SessionObserver that prints each notification as a JSON event line,
/// the way a UI shell would receive them.
pub struct ConsoleObserver;

// -- Event payloads --

#[derive(Serialize)]
struct CaptureChangedPayload<'a> {
    capturing: bool,
    device: Option<&'a str>,
}

#[derive(Serialize)]
struct StatusPayload {
    status: CaptureStatus,
}

#[derive(Serialize)]
struct MessagePayload<'a> {
    message: &'a str,
}

fn emit<T: Serialize>(event: &str, payload: &T) {
    match serde_json::to_string(payload) {
        Ok(json) => println!("{} {}", event, json),
        Err(e) => log::error!("Failed to serialize {} payload: {}", event, e),
    }
}

impl SessionObserver for ConsoleObserver {
    fn on_capture_changed(&self, activity: &CaptureActivity) {
        emit(
            "capture://changed",
            &CaptureChangedPayload {
                capturing: activity.is_capturing(),
                device: activity.device().map(|d| d.name()),
            },
        );
    }

    fn on_status_changed(&self, status: CaptureStatus) {
        emit("capture://status", &StatusPayload { status });
    }

    fn on_signal_status(&self, message: &str) {
        emit("capture://signal", &MessagePayload { message });
    }

    fn on_error(&self, error: &SessionError) {
        let message = error.to_string();
        emit("capture://error", &MessagePayload { message: &message });
    }
}
