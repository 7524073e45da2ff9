/*!
 * Lock-Free Coordinator Statistics
 * Counters that the dispatch path can bump from signal context
 */

use super::types::CoordinatorStats;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic coordinator statistics
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - Plain atomic adds only, which keeps every method async-signal-safe
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct AtomicCoordinatorStats {
    total_registrations: AtomicU64,
    total_deregistrations: AtomicU64,
    signals_dispatched: AtomicU64,
    stop_notifications: AtomicU64,
    forwarded: AtomicU64,
    restores: AtomicU64,
    superseded: AtomicU64,
}

impl AtomicCoordinatorStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn inc_registrations(&self) {
        self.total_registrations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_deregistrations(&self) {
        self.total_deregistrations.fetch_add(1, Ordering::Relaxed);
    }

    /// Signal context
    #[inline(always)]
    pub fn inc_dispatched(&self) {
        self.signals_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Signal context
    #[inline(always)]
    pub fn add_notifications(&self, count: u64) {
        self.stop_notifications.fetch_add(count, Ordering::Relaxed);
    }

    /// Signal context
    #[inline(always)]
    pub fn inc_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_restores(&self) {
        self.restores.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_superseded(&self) {
        self.superseded.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of the counters; `registered` and `installed` come from the
    /// locked state and are filled in by the caller
    ///
    /// # Note
    /// Values may not be perfectly consistent with each other due to concurrent updates,
    /// but each individual value is accurate. This is acceptable for monitoring.
    pub fn snapshot(&self, registered: usize, installed: bool) -> CoordinatorStats {
        CoordinatorStats {
            registered,
            installed,
            total_registrations: self.total_registrations.load(Ordering::Acquire),
            total_deregistrations: self.total_deregistrations.load(Ordering::Acquire),
            signals_dispatched: self.signals_dispatched.load(Ordering::Acquire),
            stop_notifications: self.stop_notifications.load(Ordering::Acquire),
            forwarded: self.forwarded.load(Ordering::Acquire),
            restores: self.restores.load(Ordering::Acquire),
            superseded: self.superseded.load(Ordering::Acquire),
        }
    }
}
