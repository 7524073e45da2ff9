/*!
 * Filesystem Signal Coordinator Library
 * Process-wide ownership of termination signals for user-space filesystem runtimes
 */

pub mod core;
pub mod monitoring;
pub mod session;
pub mod signals;

// Re-exports
pub use crate::core::config::{CoordinatorConfig, HostConfig};
pub use crate::core::errors::{CoordinatorError, CoordinatorResult, SignalOp};
pub use monitoring::init_tracing;
pub use session::{remove_signal_handlers, set_signal_handlers, Session, StopFlag};
pub use signals::{
    global, NixSignalApi, RestoreOutcome, SignalApi, SignalCoordinator, SignalKind, StopTarget,
};
