/*!
 * Signal Traits
 * Seams between the coordinator, the OS and filesystem runtimes
 */

use super::types::SignalKind;
use crate::core::errors::CoordinatorResult;
use nix::sys::signal::{SigAction, SigSet};

/// Process signal disposition interface
///
/// The coordinator only ever calls these while holding its registry lock,
/// with the termination kinds masked on the calling thread.
pub trait SignalApi: Send + Sync + 'static {
    /// Install `action` for `kind`, returning the disposition it replaced
    fn install(&self, kind: SignalKind, action: &SigAction) -> CoordinatorResult<SigAction>;

    /// Read the current disposition for `kind` without changing it
    fn current(&self, kind: SignalKind) -> CoordinatorResult<SigAction>;

    /// Add `set` to the calling thread's mask, returning the previous mask
    fn block(&self, set: &SigSet) -> CoordinatorResult<SigSet>;

    /// Replace the calling thread's mask
    fn set_mask(&self, mask: &SigSet) -> CoordinatorResult<()>;
}

/// Receiver of stop requests
///
/// `notify_stop` runs in signal-handler context: implementations must not
/// allocate, lock, block or log. Setting an atomic flag is the intended use.
pub trait StopTarget: Send + Sync {
    fn notify_stop(&self, kind: SignalKind);
}
