/*!
 * Signals Module
 * Process-wide coordination of termination signals across filesystems
 */

mod atomic_stats;
mod coordinator;
mod global;
pub mod mask;
mod os;
pub mod traits;
pub mod types;

// Re-export public API
pub use atomic_stats::AtomicCoordinatorStats;
pub use coordinator::SignalCoordinator;
pub use global::{global, init_global};
pub use mask::MaskGuard;
pub use os::NixSignalApi;
pub use traits::{SignalApi, StopTarget};
pub use types::{
    actions_equal, default_action, ignore_action, CoordinatorStats, InterceptPolicy,
    RestoreOutcome, SavedHandlerState, SignalKind,
};
