/*!
 * OS Signal Backend
 * sigaction(2) and pthread_sigmask(3) through nix
 */

use super::traits::SignalApi;
use super::types::SignalKind;
use crate::core::errors::{CoordinatorError, CoordinatorResult, SignalOp};
use nix::errno::Errno;
use nix::libc::{self, c_int, c_void, siginfo_t};
use nix::sys::signal::{
    pthread_sigmask, sigaction, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal,
};
use std::mem::MaybeUninit;
use std::ptr;

/// Signal API backed by the real process dispositions
///
/// Only the process coordinator holds one; reach it through
/// `global().api()`. A second coordinator over the real table would save
/// the first one's handler as "previous" and never hand the signal back.
#[derive(Debug)]
pub struct NixSignalApi {
    _owned: (),
}

impl NixSignalApi {
    pub(crate) const fn new() -> Self {
        Self { _owned: () }
    }
}

impl SignalApi for NixSignalApi {
    fn install(&self, kind: SignalKind, action: &SigAction) -> CoordinatorResult<SigAction> {
        // SAFETY: the only handler the coordinator installs is its own
        // trampoline, which is async-signal-safe; restoring a previously
        // saved action reinstates whatever the host had.
        unsafe { sigaction(kind.signal(), action) }
            .map_err(|errno| CoordinatorError::signal_api(SignalOp::Install(kind), errno))
    }

    fn current(&self, kind: SignalKind) -> CoordinatorResult<SigAction> {
        let mut raw = MaybeUninit::<libc::sigaction>::zeroed();
        // SAFETY: a null new-action pointer makes sigaction a pure query.
        let rc = unsafe { libc::sigaction(kind.signal() as c_int, ptr::null(), raw.as_mut_ptr()) };
        if rc != 0 {
            return Err(CoordinatorError::signal_api(
                SignalOp::Query(kind),
                Errno::last(),
            ));
        }
        // SAFETY: sigaction succeeded and filled the struct.
        let raw = unsafe { raw.assume_init() };
        Ok(from_raw_action(&raw))
    }

    fn block(&self, set: &SigSet) -> CoordinatorResult<SigSet> {
        let mut previous = SigSet::empty();
        pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(set), Some(&mut previous))
            .map_err(|errno| CoordinatorError::signal_api(SignalOp::Mask, errno))?;
        Ok(previous)
    }

    fn set_mask(&self, mask: &SigSet) -> CoordinatorResult<()> {
        pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(mask), None)
            .map_err(|errno| CoordinatorError::signal_api(SignalOp::Mask, errno))
    }
}

/// Rebuild a nix `SigAction` from the raw libc struct
fn from_raw_action(raw: &libc::sigaction) -> SigAction {
    let flags = SaFlags::from_bits_truncate(raw.sa_flags as _);
    let handler = match raw.sa_sigaction {
        libc::SIG_DFL => SigHandler::SigDfl,
        libc::SIG_IGN => SigHandler::SigIgn,
        addr if flags.contains(SaFlags::SA_SIGINFO) => {
            // SAFETY: with SA_SIGINFO the kernel stored a three-argument handler.
            let f = unsafe {
                std::mem::transmute::<usize, extern "C" fn(c_int, *mut siginfo_t, *mut c_void)>(
                    addr,
                )
            };
            SigHandler::SigAction(f)
        }
        addr => {
            // SAFETY: without SA_SIGINFO the kernel stored a one-argument handler.
            let f = unsafe { std::mem::transmute::<usize, extern "C" fn(c_int)>(addr) };
            SigHandler::Handler(f)
        }
    };

    let mut mask = SigSet::empty();
    for sig in Signal::iterator() {
        // SAFETY: sa_mask is an initialised sigset_t.
        if unsafe { libc::sigismember(&raw.sa_mask, sig as c_int) } == 1 {
            mask.add(sig);
        }
    }

    SigAction::new(handler, flags, mask)
}
