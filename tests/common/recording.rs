/*!
 * Recording Signal Backend
 * In-memory dispositions for exercising the coordinator without touching
 * the process signal table
 */

use sigcoord::signals::{default_action, SignalApi, SignalKind};
use sigcoord::{CoordinatorError, CoordinatorResult, SignalOp};
use nix::errno::Errno;
use nix::sys::signal::{SigAction, SigSet};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
struct RecordingState {
    dispositions: [SigAction; SignalKind::COUNT],
    mask: SigSet,
    installs: Vec<(SignalKind, SigAction)>,
    fail_install: Option<SignalKind>,
    fail_query: Option<SignalKind>,
    fail_mask: bool,
}

/// Signal API that keeps dispositions in memory and records every install
///
/// Failures can be injected per signal kind to exercise rollback paths.
#[derive(Debug)]
pub struct RecordingSignalApi {
    state: Mutex<RecordingState>,
    installs_while_unmasked: AtomicUsize,
}

impl RecordingSignalApi {
    /// Every kind starts at the default disposition
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RecordingState {
                dispositions: [default_action(); SignalKind::COUNT],
                mask: SigSet::empty(),
                installs: Vec::new(),
                fail_install: None,
                fail_query: None,
                fail_mask: false,
            }),
            installs_while_unmasked: AtomicUsize::new(0),
        }
    }

    /// Seed a disposition as if the host had installed it earlier
    pub fn with_disposition(self, kind: SignalKind, action: SigAction) -> Self {
        self.state.lock().dispositions[kind.index()] = action;
        self
    }

    /// Replace a disposition behind the coordinator's back
    pub fn set_disposition(&self, kind: SignalKind, action: SigAction) {
        self.state.lock().dispositions[kind.index()] = action;
    }

    pub fn disposition(&self, kind: SignalKind) -> SigAction {
        self.state.lock().dispositions[kind.index()]
    }

    /// Make every install of `kind` fail with EINVAL
    pub fn fail_install(&self, kind: Option<SignalKind>) {
        self.state.lock().fail_install = kind;
    }

    /// Make every query of `kind` fail with EINVAL
    pub fn fail_query(&self, kind: Option<SignalKind>) {
        self.state.lock().fail_query = kind;
    }

    /// Make mask changes fail with EINVAL
    pub fn fail_mask(&self, fail: bool) {
        self.state.lock().fail_mask = fail;
    }

    /// Successful installs, in order
    pub fn installs(&self) -> Vec<(SignalKind, SigAction)> {
        self.state.lock().installs.clone()
    }

    pub fn install_count(&self) -> usize {
        self.state.lock().installs.len()
    }

    /// Installs performed while the termination kinds were not masked
    pub fn installs_while_unmasked(&self) -> usize {
        self.installs_while_unmasked.load(Ordering::Relaxed)
    }

    /// Current simulated thread mask
    pub fn mask(&self) -> SigSet {
        self.state.lock().mask
    }
}

impl Default for RecordingSignalApi {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalApi for RecordingSignalApi {
    fn install(&self, kind: SignalKind, action: &SigAction) -> CoordinatorResult<SigAction> {
        let mut state = self.state.lock();
        if state.fail_install == Some(kind) {
            return Err(CoordinatorError::signal_api(
                SignalOp::Install(kind),
                Errno::EINVAL,
            ));
        }

        let masked = SignalKind::TERMINATION
            .iter()
            .all(|k| state.mask.contains(k.signal()));
        if !masked {
            self.installs_while_unmasked.fetch_add(1, Ordering::Relaxed);
        }

        let previous = std::mem::replace(&mut state.dispositions[kind.index()], *action);
        state.installs.push((kind, *action));
        Ok(previous)
    }

    fn current(&self, kind: SignalKind) -> CoordinatorResult<SigAction> {
        let state = self.state.lock();
        if state.fail_query == Some(kind) {
            return Err(CoordinatorError::signal_api(
                SignalOp::Query(kind),
                Errno::EINVAL,
            ));
        }
        Ok(state.dispositions[kind.index()])
    }

    fn block(&self, set: &SigSet) -> CoordinatorResult<SigSet> {
        let mut state = self.state.lock();
        if state.fail_mask {
            return Err(CoordinatorError::signal_api(SignalOp::Mask, Errno::EINVAL));
        }
        let previous = state.mask;
        state.mask.extend(set);
        Ok(previous)
    }

    fn set_mask(&self, mask: &SigSet) -> CoordinatorResult<()> {
        self.state.lock().mask = *mask;
        Ok(())
    }
}
