use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::config::SessionConfiguration;
use crate::models::error::BackendError;
use crate::session::capture_session::Generation;
use crate::traits::backend_gateway::BackendGateway;

/// Callback invoked with each signal check result.
///
/// Parameters:
/// - `generation`: The capture period the monitor was bound to.
/// - `result`: The backend's answer to `check_signal`.
///
/// The receiver decides whether the result is still relevant.
pub type SignalCallback =
    Arc<dyn Fn(Generation, Result<String, BackendError>) + Send + Sync + 'static>;

/// Time-bounded signal polling for one capture period.
///
/// Spawns two tasks sharing one cancellation token:
/// ```text
/// [poll task]     tick(interval) → check_signal → callback → tick ...
/// [lifetime task] sleep(lifetime) → cancel
/// ```
/// The lifetime ceiling only ends the polling; the capture keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalMonitor {
    interval: Duration,
    lifetime: Duration,
}

impl SignalMonitor {
    pub fn new(interval: Duration, lifetime: Duration) -> Self {
        Self { interval, lifetime }
    }

    pub fn from_configuration(config: &SessionConfiguration) -> Self {
        Self::new(config.signal_poll_interval(), config.signal_monitor_lifetime())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Start polling on the current tokio runtime.
    ///
    /// The first check runs one `interval` after spawning. No check starts
    /// at or after the lifetime deadline, and an in-flight check is
    /// abandoned the moment the token is cancelled.
    pub fn spawn(
        &self,
        generation: Generation,
        gateway: Arc<dyn BackendGateway>,
        callback: SignalCallback,
    ) -> MonitorHandle {
        let token = CancellationToken::new();
        let started_at = Instant::now();
        let deadline = started_at + self.lifetime;

        let lifetime_task = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {
                        log::debug!("Signal monitor {} reached its lifetime", generation);
                        token.cancel();
                    }
                }
            })
        };

        let poll_task = {
            let token = token.clone();
            let interval = self.interval;
            tokio::spawn(async move {
                poll_loop(generation, gateway, callback, token, interval, deadline).await;
            })
        };

        log::debug!(
            "Signal monitor {} started ({:?} interval, {:?} lifetime)",
            generation,
            self.interval,
            self.lifetime
        );

        MonitorHandle {
            generation,
            token,
            started_at,
            poll_task,
            lifetime_task,
        }
    }
}

async fn poll_loop(
    generation: Generation,
    gateway: Arc<dyn BackendGateway>,
    callback: SignalCallback,
    token: CancellationToken,
    interval: Duration,
    deadline: Instant,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut polls: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        if Instant::now() >= deadline {
            break;
        }

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            result = gateway.check_signal() => result,
        };
        if token.is_cancelled() {
            break;
        }

        polls += 1;
        callback(generation, result);
    }

    token.cancel();
    log::debug!("Signal monitor {} finished after {} poll(s)", generation, polls);
}

/// Owner's handle on a running signal monitor.
///
/// Dropping the handle cancels the monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    generation: Generation,
    token: CancellationToken,
    started_at: Instant,
    poll_task: JoinHandle<()>,
    lifetime_task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Stop both tasks. No callback is invoked after this returns.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the monitor is still allowed to poll.
    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled() && !self.poll_task.is_finished()
    }

    /// Wait for both tasks to exit.
    pub async fn join(mut self) {
        let _ = (&mut self.poll_task).await;
        let _ = (&mut self.lifetime_task).await;
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
