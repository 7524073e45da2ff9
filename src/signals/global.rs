/*!
 * Process Coordinator
 * The initialization-once coordinator and the handler the OS actually calls
 */

use super::coordinator::SignalCoordinator;
use super::os::NixSignalApi;
use super::types::SignalKind;
use crate::core::config::CoordinatorConfig;
use nix::libc::{c_int, c_void, siginfo_t};
use nix::sys::signal::{SaFlags, SigAction, SigHandler};
use std::sync::OnceLock;

static COORDINATOR: OnceLock<SignalCoordinator<NixSignalApi>> = OnceLock::new();

/// Process-wide coordinator backed by the real signal table
///
/// Configuration is read from the environment on first use unless
/// [`init_global`] ran earlier.
pub fn global() -> &'static SignalCoordinator<NixSignalApi> {
    COORDINATOR.get_or_init(|| {
        SignalCoordinator::with_config(NixSignalApi::new(), CoordinatorConfig::from_env())
    })
}

/// Initialise the process coordinator with an explicit configuration
///
/// Returns false if it was already initialised, in which case `config` is
/// not applied.
pub fn init_global(config: CoordinatorConfig) -> bool {
    let mut applied = false;
    COORDINATOR.get_or_init(|| {
        applied = true;
        SignalCoordinator::with_config(NixSignalApi::new(), config)
    });
    applied
}

/// Handler installed for the termination kinds
extern "C" fn on_signal(signo: c_int, info: *mut siginfo_t, context: *mut c_void) {
    let Some(kind) = SignalKind::from_raw(signo) else {
        return;
    };
    if let Some(coordinator) = COORDINATOR.get() {
        coordinator.dispatch(kind, info, context);
    }
}

/// Disposition the coordinator installs for the termination kinds
///
/// The other termination kinds are masked while the handler runs, so a
/// second signal cannot re-enter dispatch on a thread that already holds
/// the registry lock.
pub(crate) fn coordinator_action() -> SigAction {
    SigAction::new(
        SigHandler::SigAction(on_signal),
        SaFlags::SA_SIGINFO | SaFlags::SA_RESTART,
        SignalKind::termination_set(),
    )
}

pub(crate) fn is_coordinator_handler(handler: &SigHandler) -> bool {
    *handler == coordinator_action().handler()
}
