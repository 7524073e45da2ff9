/*!
 * Signal Coordinator
 * Process-wide registry of mounted filesystems that owns the termination
 * signals while any filesystem is registered
 */

use super::atomic_stats::AtomicCoordinatorStats;
use super::global::{coordinator_action, is_coordinator_handler};
use super::mask::MaskGuard;
use super::traits::{SignalApi, StopTarget};
use super::types::{
    ignore_action, CoordinatorStats, InterceptPolicy, RestoreOutcome, SavedHandlerState,
    SignalKind,
};
use crate::core::config::CoordinatorConfig;
use crate::core::errors::{CoordinatorError, CoordinatorResult};
use crate::core::limits::INITIAL_REGISTRY_CAPACITY;
use crate::monitoring::OperationSpan;
use nix::libc::{c_int, c_void, siginfo_t};
use nix::sys::signal::SigHandler;
use parking_lot::{Mutex, MutexGuard};
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One mounted filesystem awaiting stop notification
struct RegisteredFilesystem {
    id: u64,
    target: Arc<dyn StopTarget>,
}

/// Everything guarded by the coordinator lock
struct CoordinatorState {
    registry: Vec<RegisteredFilesystem>,
    saved: [Option<SavedHandlerState>; SignalKind::COUNT],
}

impl CoordinatorState {
    fn new() -> Self {
        Self {
            registry: Vec::new(),
            saved: [None; SignalKind::COUNT],
        }
    }

    fn position(&self, target: &Arc<dyn StopTarget>) -> Option<usize> {
        self.registry
            .iter()
            .position(|entry| same_target(&entry.target, target))
    }

    /// Check if any kind still has saved state, i.e. is still owned
    fn installed(&self) -> bool {
        self.saved.iter().any(Option::is_some)
    }
}

/// Pointer identity, ignoring the vtable half of the fat pointer
fn same_target(a: &Arc<dyn StopTarget>, b: &Arc<dyn StopTarget>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Signal coordinator
///
/// While at least one filesystem is registered, SIGHUP, SIGINT and SIGTERM
/// are routed to every registered [`StopTarget`] and then forwarded to
/// whatever handler was installed before. SIGPIPE is set to ignore if it was
/// still at its default. When the last filesystem leaves, every disposition
/// is handed back unless a third party replaced it in the meantime. A kind
/// whose restore fails stays owned, and the next deregistration retries it.
///
/// The registry keeps each target alive until it is deregistered, so the
/// dispatch path never drops the last reference to a filesystem.
///
/// A coordinator over the real signal table only exists as [`super::global`];
/// the handler the OS calls routes to that instance.
pub struct SignalCoordinator<A: SignalApi> {
    api: A,
    config: CoordinatorConfig,
    state: Mutex<CoordinatorState>,
    stats: AtomicCoordinatorStats,
    next_id: AtomicU64,
}

impl<A: SignalApi> SignalCoordinator<A> {
    pub fn new(api: A) -> Self {
        Self::with_config(api, CoordinatorConfig::default())
    }

    pub fn with_config(api: A, config: CoordinatorConfig) -> Self {
        Self {
            api,
            config,
            state: Mutex::new(CoordinatorState::new()),
            stats: AtomicCoordinatorStats::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Register a filesystem for stop notification
    ///
    /// The first registration takes the signals over. Registering a
    /// filesystem that is already registered succeeds without change. On
    /// failure no new disposition stays installed and the registry is
    /// untouched.
    pub fn register_filesystem<T>(&self, handle: &Arc<T>) -> CoordinatorResult<()>
    where
        T: StopTarget + 'static,
    {
        let target: Arc<dyn StopTarget> = handle.clone();
        let span = OperationSpan::new("register_filesystem");
        let _entered = span.enter();

        let _mask = MaskGuard::block_termination(&self.api)?;
        let mut state = self.state.lock();

        if state.position(&target).is_some() {
            debug!("Filesystem already registered for signals");
            return Ok(());
        }

        // Capacity is checked and reserved before any disposition changes,
        // so a failed allocation leaves nothing to roll back
        if let Err(e) = self.reserve_slot(&mut state) {
            span.record_error(&e.to_string());
            return Err(e);
        }

        if state.registry.is_empty() {
            if let Err(e) = self.install_handlers(&mut state) {
                span.record_error(&e.to_string());
                return Err(e);
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        state.registry.push(RegisteredFilesystem { id, target });
        self.stats.inc_registrations();

        info!(
            registration = id,
            registered = state.registry.len(),
            "Filesystem registered for signals"
        );
        Ok(())
    }

    /// Deregister a filesystem
    ///
    /// Unknown filesystems are ignored. When the registry is empty every
    /// owned signal kind is handed back; the handle is removed even if a
    /// restore fails, and the first restore error is returned.
    pub fn deregister_filesystem<T>(&self, handle: &Arc<T>) -> CoordinatorResult<()>
    where
        T: StopTarget + 'static,
    {
        let target: Arc<dyn StopTarget> = handle.clone();
        let span = OperationSpan::new("deregister_filesystem");
        let _entered = span.enter();

        let _mask = MaskGuard::block_termination(&self.api)?;
        let mut state = self.state.lock();

        let removed = match state.position(&target) {
            Some(index) => {
                let entry = state.registry.swap_remove(index);
                self.stats.inc_deregistrations();
                info!(
                    registration = entry.id,
                    registered = state.registry.len(),
                    "Filesystem deregistered from signals"
                );
                Some(entry)
            }
            None => {
                debug!("Filesystem was not registered for signals");
                None
            }
        };

        let result = if state.registry.is_empty() && state.installed() {
            self.restore_handlers(&mut state)
        } else {
            Ok(())
        };
        drop(state);
        // The registry's reference goes away outside the lock
        drop(removed);

        if let Err(e) = &result {
            span.record_error(&e.to_string());
        }
        result
    }

    /// Hand `kind` back to its previous owner now
    ///
    /// Reinstalls the saved disposition only if the coordinator's own
    /// disposition is still in place. If the OS call fails the kind stays
    /// owned. This can be called while filesystems are still registered.
    pub fn try_restore(&self, kind: SignalKind) -> CoordinatorResult<RestoreOutcome> {
        let _mask = MaskGuard::block_termination(&self.api)?;
        let mut state = self.state.lock();
        self.restore_kind(&mut state, kind)
    }

    /// Deliver `kind` as if the OS had raised it
    ///
    /// Notifies every registered filesystem, then forwards to the handler
    /// saved for `kind`. A forwarded three-argument handler receives null
    /// `siginfo` and context pointers.
    pub fn dispatch_on_signal(&self, kind: SignalKind) {
        self.dispatch(kind, ptr::null_mut(), ptr::null_mut());
    }

    /// Signal-context entry point
    ///
    /// No allocation, no logging, no parking and no reference-count changes:
    /// the lock is taken by spinning, targets are borrowed from the registry,
    /// and the saved handler is copied out before the lock is released.
    pub(crate) fn dispatch(&self, kind: SignalKind, info: *mut siginfo_t, context: *mut c_void) {
        self.stats.inc_dispatched();

        let previous = {
            let state = self.lock_spinning();
            if kind.requests_stop() {
                for entry in state.registry.iter() {
                    entry.target.notify_stop(kind);
                }
                self.stats.add_notifications(state.registry.len() as u64);
            }
            state.saved[kind.index()].map(|saved| saved.previous.handler())
        };

        let Some(handler) = previous else {
            return;
        };
        if is_coordinator_handler(&handler) {
            return;
        }

        let signo = kind.signal() as c_int;
        match handler {
            SigHandler::Handler(f) => {
                f(signo);
                self.stats.inc_forwarded();
            }
            SigHandler::SigAction(f) => {
                f(signo, info, context);
                self.stats.inc_forwarded();
            }
            // The coordinator owns these kinds while installed; the default
            // action is absorbed rather than re-raised
            SigHandler::SigDfl | SigHandler::SigIgn => {}
        }
    }

    /// Number of registered filesystems
    pub fn registered_count(&self) -> usize {
        self.state.lock().registry.len()
    }

    pub fn is_registered<T>(&self, handle: &Arc<T>) -> bool
    where
        T: StopTarget + 'static,
    {
        let target: Arc<dyn StopTarget> = handle.clone();
        self.state.lock().position(&target).is_some()
    }

    /// Check if the coordinator currently owns any signal kind
    pub fn is_installed(&self) -> bool {
        self.state.lock().installed()
    }

    /// Check if saved state exists for `kind`
    pub fn owns(&self, kind: SignalKind) -> bool {
        self.state.lock().saved[kind.index()].is_some()
    }

    pub fn stats(&self) -> CoordinatorStats {
        let (registered, installed) = {
            let state = self.state.lock();
            (state.registry.len(), state.installed())
        };
        self.stats.snapshot(registered, installed)
    }

    fn reserve_slot(&self, state: &mut CoordinatorState) -> CoordinatorResult<()> {
        let limit = self.config.max_filesystems;
        if state.registry.len() >= limit {
            warn!(limit, "Signal registry is full");
            return Err(CoordinatorError::Allocation(format!(
                "registry capacity of {} filesystems reached",
                limit
            )));
        }

        let additional = if state.registry.capacity() == 0 {
            INITIAL_REGISTRY_CAPACITY.min(limit)
        } else {
            1
        };
        state.registry.try_reserve(additional)?;
        Ok(())
    }

    /// Take over every kind not already owned, rolling back what this call
    /// took on the first failure
    fn install_handlers(&self, state: &mut CoordinatorState) -> CoordinatorResult<()> {
        let ours = coordinator_action();
        let mut taken = [false; SignalKind::COUNT];

        for kind in SignalKind::ALL {
            if state.saved[kind.index()].is_some() {
                debug!(signal = %kind, "Signal still owned from an earlier failed restore");
                continue;
            }

            let result = match kind.policy() {
                InterceptPolicy::TakeOver => self.take_over(kind),
                InterceptPolicy::IgnoreIfDefault if self.config.ignore_broken_pipe => {
                    self.ignore_if_default(kind)
                }
                InterceptPolicy::IgnoreIfDefault => Ok(None),
            };

            match result {
                Ok(saved) => {
                    taken[kind.index()] = saved.is_some();
                    state.saved[kind.index()] = saved;
                }
                Err(e) => {
                    warn!(signal = %kind, error = %e, "Signal takeover failed, rolling back");
                    self.rollback(state, &taken);
                    return Err(e);
                }
            }
        }

        debug!(
            handler = ?ours.handler(),
            ignore_broken_pipe = state.saved[SignalKind::BrokenPipe.index()].is_some(),
            "Coordinator signal handlers installed"
        );
        Ok(())
    }

    fn take_over(&self, kind: SignalKind) -> CoordinatorResult<Option<SavedHandlerState>> {
        // Saving our own handler as "previous" would make it impossible to
        // ever hand the signal back
        let current = self.api.current(kind)?;
        if is_coordinator_handler(&current.handler()) {
            return Err(CoordinatorError::HandlerConflict(kind));
        }

        let ours = coordinator_action();
        let previous = self.api.install(kind, &ours)?;
        Ok(Some(SavedHandlerState {
            kind,
            previous,
            installed: ours,
        }))
    }

    fn ignore_if_default(&self, kind: SignalKind) -> CoordinatorResult<Option<SavedHandlerState>> {
        let current = self.api.current(kind)?;
        if current.handler() != SigHandler::SigDfl {
            debug!(signal = %kind, "Signal already handled, leaving it alone");
            return Ok(None);
        }

        let ignore = ignore_action();
        let previous = self.api.install(kind, &ignore)?;
        Ok(Some(SavedHandlerState {
            kind,
            previous,
            installed: ignore,
        }))
    }

    fn rollback(&self, state: &mut CoordinatorState, taken: &[bool; SignalKind::COUNT]) {
        for kind in SignalKind::ALL {
            if !taken[kind.index()] {
                continue;
            }
            let Some(saved) = state.saved[kind.index()] else {
                continue;
            };
            match self.api.install(kind, &saved.previous) {
                Ok(_) => state.saved[kind.index()] = None,
                Err(e) => {
                    warn!(signal = %kind, error = %e, "Rollback of signal disposition failed; kind stays owned");
                }
            }
        }
    }

    fn restore_handlers(&self, state: &mut CoordinatorState) -> CoordinatorResult<()> {
        let mut first_error = None;
        for kind in SignalKind::ALL {
            if let Err(e) = self.restore_kind(state, kind) {
                warn!(signal = %kind, error = %e, "Failed to restore signal disposition");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                debug!("Coordinator signal handlers removed");
                Ok(())
            }
        }
    }

    /// Saved state is only cleared once the kind is no longer ours
    fn restore_kind(
        &self,
        state: &mut CoordinatorState,
        kind: SignalKind,
    ) -> CoordinatorResult<RestoreOutcome> {
        let Some(saved) = state.saved[kind.index()] else {
            return Ok(RestoreOutcome::NotOwned);
        };

        let current = self.api.current(kind)?;
        if !saved.still_installed(&current) {
            warn!(
                signal = %kind,
                "Signal handler was replaced by a third party; leaving it in place"
            );
            state.saved[kind.index()] = None;
            self.stats.inc_superseded();
            return Ok(RestoreOutcome::Superseded);
        }

        self.api.install(kind, &saved.previous)?;
        state.saved[kind.index()] = None;
        self.stats.inc_restores();
        debug!(signal = %kind, "Signal disposition restored");
        Ok(RestoreOutcome::Restored)
    }

    fn lock_spinning(&self) -> MutexGuard<'_, CoordinatorState> {
        let mut spins = 0u32;
        loop {
            if let Some(guard) = self.state.try_lock() {
                return guard;
            }
            if spins < self.config.dispatch_spin_limit {
                spins += 1;
                std::hint::spin_loop();
            } else {
                std::thread::yield_now();
            }
        }
    }
}
