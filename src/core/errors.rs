/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use crate::signals::SignalKind;
use miette::Diagnostic;
use nix::errno::Errno;
use std::collections::TryReserveError;
use std::fmt;
use thiserror::Error;

/// Coordinator operation result
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// OS signal primitive that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOp {
    /// Installing a disposition with `sigaction(2)`
    Install(SignalKind),
    /// Reading the current disposition without changing it
    Query(SignalKind),
    /// Changing the calling thread's signal mask
    Mask,
}

impl fmt::Display for SignalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalOp::Install(kind) => write!(f, "install {}", kind),
            SignalOp::Query(kind) => write!(f, "query {}", kind),
            SignalOp::Mask => write!(f, "thread signal mask"),
        }
    }
}

/// Signal coordinator errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum CoordinatorError {
    #[error("Failed to allocate coordinator state: {0}")]
    #[diagnostic(
        code(coordinator::allocation),
        help("The process is out of memory. The filesystem cannot be mounted safely.")
    )]
    Allocation(String),

    #[error("Signal API call failed ({op}): {errno}")]
    #[diagnostic(
        code(coordinator::signal_api),
        help("The OS rejected a signal disposition change. Check seccomp or sandbox policy.")
    )]
    SignalApi { op: SignalOp, errno: Errno },

    #[error("{0} is already routed to a signal coordinator")]
    #[diagnostic(
        code(coordinator::handler_conflict),
        help("The coordinator's handler is installed but no saved state exists for it. Reinstall the host's own disposition before mounting.")
    )]
    HandlerConflict(SignalKind),
}

impl CoordinatorError {
    pub fn signal_api(op: SignalOp, errno: Errno) -> Self {
        CoordinatorError::SignalApi { op, errno }
    }

    /// Check if the failure came from the OS signal primitives
    pub fn is_signal_api(&self) -> bool {
        matches!(self, CoordinatorError::SignalApi { .. })
    }
}

impl From<TryReserveError> for CoordinatorError {
    fn from(err: TryReserveError) -> Self {
        CoordinatorError::Allocation(err.to_string())
    }
}
