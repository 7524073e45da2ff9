/*!
 * Shared Test Helpers
 */

#![allow(dead_code)]

mod recording;

pub use recording::RecordingSignalApi;

use nix::libc::c_int;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal};
use sigcoord::signals::{SignalCoordinator, SignalKind, StopTarget};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Global event sequence, used to check notify-before-forward ordering
pub static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Sequence number at which the host handler last ran
pub static HOST_HANDLER_SEQ: AtomicU64 = AtomicU64::new(0);
pub static HOST_HANDLER_CALLS: AtomicUsize = AtomicUsize::new(0);

pub extern "C" fn host_handler(_signo: c_int) {
    HOST_HANDLER_SEQ.store(SEQUENCE.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
    HOST_HANDLER_CALLS.fetch_add(1, Ordering::SeqCst);
}

pub fn reset_host_handler() {
    HOST_HANDLER_SEQ.store(0, Ordering::SeqCst);
    HOST_HANDLER_CALLS.store(0, Ordering::SeqCst);
}

/// A host's own disposition, with flags and mask so restores are checked
/// field by field
pub fn host_action() -> SigAction {
    let mut mask = SigSet::empty();
    mask.add(Signal::SIGUSR1);
    SigAction::new(SigHandler::Handler(host_handler), SaFlags::SA_RESTART, mask)
}

/// Stop target that counts notifications and remembers when it was last hit
#[derive(Debug, Default)]
pub struct RecordingTarget {
    pub notifications: AtomicUsize,
    pub last_seq: AtomicU64,
}

impl RecordingTarget {
    pub fn count(&self) -> usize {
        self.notifications.load(Ordering::SeqCst)
    }

    pub fn last_seq(&self) -> u64 {
        self.last_seq.load(Ordering::SeqCst)
    }
}

impl StopTarget for RecordingTarget {
    fn notify_stop(&self, _kind: SignalKind) {
        self.last_seq
            .store(SEQUENCE.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
        self.notifications.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn recording_coordinator() -> SignalCoordinator<RecordingSignalApi> {
    SignalCoordinator::new(RecordingSignalApi::new())
}

/// Snapshot of every disposition the recording backend holds
pub fn snapshot(coordinator: &SignalCoordinator<RecordingSignalApi>) -> Vec<SigAction> {
    SignalKind::ALL
        .iter()
        .map(|kind| coordinator.api().disposition(*kind))
        .collect()
}

pub fn snapshots_equal(a: &[SigAction], b: &[SigAction]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| sigcoord::signals::actions_equal(x, y))
}
