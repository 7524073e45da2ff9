/*!
 * Mask Guard Tests
 * Thread mask handling against the recording backend
 */

mod common;

use common::RecordingSignalApi;
use nix::sys::signal::{SigSet, Signal};
use sigcoord::signals::{MaskGuard, SignalApi};

#[test]
fn test_guard_blocks_and_restores() {
    let api = RecordingSignalApi::new();
    {
        let _guard = MaskGuard::block_termination(&api).unwrap();
        let mask = api.mask();
        assert!(mask.contains(Signal::SIGHUP));
        assert!(mask.contains(Signal::SIGINT));
        assert!(mask.contains(Signal::SIGTERM));
    }
    assert!(!api.mask().contains(Signal::SIGTERM));
}

#[test]
fn test_guard_keeps_outer_mask() {
    let api = RecordingSignalApi::new();
    let mut outer = SigSet::empty();
    outer.add(Signal::SIGUSR1);
    api.block(&outer).unwrap();

    drop(MaskGuard::block_termination(&api).unwrap());

    let mask = api.mask();
    assert!(mask.contains(Signal::SIGUSR1));
    assert!(!mask.contains(Signal::SIGINT));
}

#[test]
fn test_guard_failure_leaves_mask_untouched() {
    let api = RecordingSignalApi::new();
    api.fail_mask(true);

    assert!(MaskGuard::block_termination(&api).is_err());
    assert!(!api.mask().contains(Signal::SIGTERM));
}
