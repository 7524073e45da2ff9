/*!
 * Session Runner
 * Flag-check loops that turn asynchronous stop signals into ordinary polling
 */

use super::flag::StopFlag;
use crate::core::errors::CoordinatorResult;
use crate::signals::{SignalApi, SignalCoordinator, SignalKind};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// How a session loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// The stop flag was raised, by a signal or by `exit()`
    Stopped {
        reason: Option<SignalKind>,
        iterations: u64,
    },
    /// The step closure ended the loop itself
    Finished { iterations: u64 },
}

/// A mounted filesystem's event loop
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    name: String,
    flag: Arc<StopFlag>,
}

impl Session {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            flag: Arc::new(StopFlag::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stop target registered with the coordinator
    pub fn flag(&self) -> &Arc<StopFlag> {
        &self.flag
    }

    /// Ask the loop to stop at its next poll
    pub fn exit(&self) {
        self.flag.request_stop();
    }

    pub fn exited(&self) -> bool {
        self.flag.is_stopped()
    }

    pub fn stop_reason(&self) -> Option<SignalKind> {
        self.flag.reason()
    }

    /// Run `step` every `poll_interval` on the current thread until stopped
    pub fn run_blocking<F>(&self, poll_interval: Duration, mut step: F) -> SessionExit
    where
        F: FnMut() -> ControlFlow<()>,
    {
        let mut iterations = 0u64;
        loop {
            if let Some(exit) = self.check_stop(iterations) {
                return exit;
            }
            iterations += 1;
            if step().is_break() {
                return self.finished(iterations);
            }
            std::thread::sleep(poll_interval);
        }
    }

    /// Run `step` on a tokio interval until stopped
    pub async fn run<F>(&self, poll_interval: Duration, mut step: F) -> SessionExit
    where
        F: FnMut() -> ControlFlow<()>,
    {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let mut iterations = 0u64;
        loop {
            ticker.tick().await;
            if let Some(exit) = self.check_stop(iterations) {
                return exit;
            }
            iterations += 1;
            if step().is_break() {
                return self.finished(iterations);
            }
        }
    }

    fn check_stop(&self, iterations: u64) -> Option<SessionExit> {
        if !self.flag.is_stopped() {
            return None;
        }
        let reason = self.flag.reason();
        info!(
            session = %self.name,
            reason = ?reason,
            iterations,
            "Session stopping"
        );
        Some(SessionExit::Stopped { reason, iterations })
    }

    fn finished(&self, iterations: u64) -> SessionExit {
        debug!(session = %self.name, iterations, "Session loop finished");
        SessionExit::Finished { iterations }
    }
}

/// Register `session` with the coordinator for termination signals
pub fn set_signal_handlers<A: SignalApi>(
    coordinator: &SignalCoordinator<A>,
    session: &Session,
) -> CoordinatorResult<()> {
    coordinator.register_filesystem(session.flag())?;
    debug!(session = %session.name, id = %session.id, "Signal handlers set");
    Ok(())
}

/// Deregister `session`; the last one out restores the prior dispositions
pub fn remove_signal_handlers<A: SignalApi>(
    coordinator: &SignalCoordinator<A>,
    session: &Session,
) -> CoordinatorResult<()> {
    coordinator.deregister_filesystem(session.flag())?;
    debug!(session = %session.name, id = %session.id, "Signal handlers removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::StopTarget;

    #[test]
    fn test_run_blocking_until_exit() {
        let session = Session::new("blocking");
        let handle = session.clone();
        let mut steps = 0;
        let exit = session.run_blocking(Duration::from_millis(1), || {
            steps += 1;
            if steps == 3 {
                handle.exit();
            }
            ControlFlow::Continue(())
        });
        assert_eq!(
            exit,
            SessionExit::Stopped {
                reason: None,
                iterations: 3
            }
        );
    }

    #[test]
    fn test_run_blocking_finished() {
        let session = Session::new("finite");
        let exit = session.run_blocking(Duration::from_millis(1), || ControlFlow::Break(()));
        assert_eq!(exit, SessionExit::Finished { iterations: 1 });
        assert!(!session.exited());
    }

    #[tokio::test]
    async fn test_run_stops_on_signal_flag() {
        let session = Session::new("async");
        let flag = session.flag().clone();
        let exit = session
            .run(Duration::from_millis(1), || {
                flag.notify_stop(SignalKind::Hangup);
                ControlFlow::Continue(())
            })
            .await;
        assert_eq!(
            exit,
            SessionExit::Stopped {
                reason: Some(SignalKind::Hangup),
                iterations: 1
            }
        );
        assert_eq!(session.stop_reason(), Some(SignalKind::Hangup));
    }
}
