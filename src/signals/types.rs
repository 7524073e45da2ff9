/*!
 * Signal Types
 * Intercepted signal kinds, saved dispositions and coordinator statistics
 */

use nix::libc::c_int;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signal kinds the coordinator intercepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Hangup on the controlling terminal
    Hangup,
    /// Interrupt from keyboard (Ctrl+C)
    Interrupt,
    /// Termination request
    Terminate,
    /// Write to a pipe with no reader
    BrokenPipe,
}

/// How the coordinator takes a signal kind over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptPolicy {
    /// Unconditionally install the coordinator handler
    TakeOver,
    /// Install "ignore", but only if the disposition is still default
    IgnoreIfDefault,
}

impl SignalKind {
    /// Every kind, in table order
    pub const ALL: [SignalKind; 4] = [
        SignalKind::Hangup,
        SignalKind::Interrupt,
        SignalKind::Terminate,
        SignalKind::BrokenPipe,
    ];

    /// Kinds that trigger a stop broadcast
    pub const TERMINATION: [SignalKind; 3] =
        [SignalKind::Hangup, SignalKind::Interrupt, SignalKind::Terminate];

    pub const COUNT: usize = Self::ALL.len();

    /// Map from an OS signal number. Pure match, usable in signal context.
    pub fn from_raw(signo: c_int) -> Option<Self> {
        match signo {
            nix::libc::SIGHUP => Some(SignalKind::Hangup),
            nix::libc::SIGINT => Some(SignalKind::Interrupt),
            nix::libc::SIGTERM => Some(SignalKind::Terminate),
            nix::libc::SIGPIPE => Some(SignalKind::BrokenPipe),
            _ => None,
        }
    }

    /// Get the OS signal
    pub fn signal(&self) -> Signal {
        match self {
            SignalKind::Hangup => Signal::SIGHUP,
            SignalKind::Interrupt => Signal::SIGINT,
            SignalKind::Terminate => Signal::SIGTERM,
            SignalKind::BrokenPipe => Signal::SIGPIPE,
        }
    }

    /// Position in the saved-state table
    pub fn index(&self) -> usize {
        match self {
            SignalKind::Hangup => 0,
            SignalKind::Interrupt => 1,
            SignalKind::Terminate => 2,
            SignalKind::BrokenPipe => 3,
        }
    }

    pub fn policy(&self) -> InterceptPolicy {
        match self {
            SignalKind::BrokenPipe => InterceptPolicy::IgnoreIfDefault,
            _ => InterceptPolicy::TakeOver,
        }
    }

    /// Check if delivery of this kind asks filesystems to stop
    pub fn requests_stop(&self) -> bool {
        self.policy() == InterceptPolicy::TakeOver
    }

    /// Signal set of the termination kinds, used both as the handler's
    /// `sa_mask` and as the thread mask held around the registry lock
    pub fn termination_set() -> SigSet {
        let mut set = SigSet::empty();
        for kind in Self::TERMINATION {
            set.add(kind.signal());
        }
        set
    }
}

impl TryFrom<Signal> for SignalKind {
    type Error = Signal;

    fn try_from(signal: Signal) -> Result<Self, Self::Error> {
        SignalKind::from_raw(signal as c_int).ok_or(signal)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signal().as_str())
    }
}

/// Default disposition (`SIG_DFL`, no flags, empty mask)
pub fn default_action() -> SigAction {
    SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty())
}

/// Ignore disposition (`SIG_IGN`, no flags, empty mask)
pub fn ignore_action() -> SigAction {
    SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty())
}

/// Compare two dispositions field by field: handler, flags and mask
pub fn actions_equal(a: &SigAction, b: &SigAction) -> bool {
    if a.handler() != b.handler() || a.flags() != b.flags() {
        return false;
    }
    let (mask_a, mask_b) = (a.mask(), b.mask());
    Signal::iterator().all(|sig| mask_a.contains(sig) == mask_b.contains(sig))
}

/// Disposition that existed before the coordinator took a signal kind
#[derive(Debug, Clone, Copy)]
pub struct SavedHandlerState {
    pub kind: SignalKind,
    /// What was installed before the coordinator
    pub previous: SigAction,
    /// What the coordinator installed in its place
    pub installed: SigAction,
}

impl SavedHandlerState {
    /// Check if `current` is still the disposition the coordinator installed
    pub fn still_installed(&self, current: &SigAction) -> bool {
        current.handler() == self.installed.handler()
    }
}

/// Result of trying to hand a signal kind back to its previous owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestoreOutcome {
    /// The previous disposition was reinstalled
    Restored,
    /// A third party replaced the coordinator's handler; it was left alone
    Superseded,
    /// The coordinator did not own this kind
    NotOwned,
}

/// Coordinator statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorStats {
    pub registered: usize,
    pub installed: bool,
    pub total_registrations: u64,
    pub total_deregistrations: u64,
    pub signals_dispatched: u64,
    pub stop_notifications: u64,
    pub forwarded: u64,
    pub restores: u64,
    pub superseded: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw() {
        assert_eq!(SignalKind::from_raw(nix::libc::SIGTERM), Some(SignalKind::Terminate));
        assert_eq!(SignalKind::from_raw(nix::libc::SIGPIPE), Some(SignalKind::BrokenPipe));
        assert_eq!(SignalKind::from_raw(nix::libc::SIGUSR1), None);
        assert_eq!(SignalKind::try_from(Signal::SIGUSR2), Err(Signal::SIGUSR2));
    }

    #[test]
    fn test_index_matches_table_order() {
        for (i, kind) in SignalKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_policy() {
        assert!(SignalKind::Hangup.requests_stop());
        assert!(SignalKind::Interrupt.requests_stop());
        assert!(SignalKind::Terminate.requests_stop());
        assert!(!SignalKind::BrokenPipe.requests_stop());

        let set = SignalKind::termination_set();
        assert!(set.contains(Signal::SIGINT));
        assert!(!set.contains(Signal::SIGPIPE));
    }

    #[test]
    fn test_actions_equal() {
        assert!(actions_equal(&default_action(), &default_action()));
        assert!(!actions_equal(&default_action(), &ignore_action()));

        let mut mask = SigSet::empty();
        mask.add(Signal::SIGUSR1);
        let masked = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), mask);
        assert!(!actions_equal(&default_action(), &masked));
    }

    #[test]
    fn test_display() {
        assert_eq!(SignalKind::Hangup.to_string(), "SIGHUP");
        assert_eq!(SignalKind::BrokenPipe.to_string(), "SIGPIPE");
    }
}
