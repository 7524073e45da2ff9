/*!
 * Stop Flag
 * The only state the dispatch path writes into a filesystem
 */

use crate::signals::{SignalKind, StopTarget};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

const NO_SIGNAL: u8 = 0;

/// Atomic stop request polled by a session loop
#[derive(Debug, Default)]
pub struct StopFlag {
    stopped: AtomicBool,
    /// `SignalKind::index() + 1` of the last signal that requested the stop
    reason: AtomicU8,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop without a signal
    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Signal that requested the stop, if any
    pub fn reason(&self) -> Option<SignalKind> {
        match self.reason.load(Ordering::Acquire) {
            NO_SIGNAL => None,
            n => SignalKind::ALL.get(usize::from(n) - 1).copied(),
        }
    }

    /// Clear the flag before re-running a session
    pub fn reset(&self) {
        self.reason.store(NO_SIGNAL, Ordering::Release);
        self.stopped.store(false, Ordering::Release);
    }
}

impl StopTarget for StopFlag {
    fn notify_stop(&self, kind: SignalKind) {
        self.reason.store(kind.index() as u8 + 1, Ordering::Release);
        self.stopped.store(true, Ordering::Release);
    }
}
