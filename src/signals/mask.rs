/*!
 * Thread Mask Guard
 * Blocks the termination kinds on the calling thread for a scope
 */

use super::traits::SignalApi;
use super::types::SignalKind;
use crate::core::errors::CoordinatorResult;
use nix::sys::signal::SigSet;
use tracing::warn;

/// RAII guard holding the termination kinds blocked on the current thread
///
/// While the guard lives, a termination signal aimed at this thread stays
/// pending, so the dispatch path can never spin on a lock this thread holds.
/// Dropping the guard restores the previous mask, after which any pending
/// signal is delivered.
#[must_use = "signals are unblocked as soon as the guard is dropped"]
pub struct MaskGuard<'a, A: SignalApi> {
    api: &'a A,
    previous: SigSet,
}

impl<'a, A: SignalApi> MaskGuard<'a, A> {
    pub fn block_termination(api: &'a A) -> CoordinatorResult<Self> {
        let previous = api.block(&SignalKind::termination_set())?;
        Ok(Self { api, previous })
    }
}

impl<A: SignalApi> Drop for MaskGuard<'_, A> {
    fn drop(&mut self) {
        if let Err(e) = self.api.set_mask(&self.previous) {
            warn!(error = %e, "Failed to restore thread signal mask");
        }
    }
}

