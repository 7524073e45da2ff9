/*!
 * Coordinator Configuration
 *
 * Runtime configuration for the coordinator and the demo host
 */

use super::limits::{
    DEFAULT_DISPATCH_SPINS, DEFAULT_HOST_FILESYSTEMS, DEFAULT_MAX_FILESYSTEMS,
    DEFAULT_POLL_INTERVAL, MAX_DISPATCH_SPINS, MAX_HOST_FILESYSTEMS, MIN_POLL_INTERVAL,
};
use std::time::Duration;

/// Coordinator configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Set SIGPIPE to ignore while filesystems are registered, if it was at default
    pub ignore_broken_pipe: bool,
    /// Lock spins in the dispatch path before it starts yielding
    pub dispatch_spin_limit: u32,
    /// Registrations accepted before `Allocation` is returned
    pub max_filesystems: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            ignore_broken_pipe: true,
            dispatch_spin_limit: DEFAULT_DISPATCH_SPINS,
            max_filesystems: DEFAULT_MAX_FILESYSTEMS,
        }
    }
}

impl CoordinatorConfig {
    /// Only the three termination signals; SIGPIPE is left to the host
    pub const fn termination_only() -> Self {
        Self {
            ignore_broken_pipe: false,
            dispatch_spin_limit: DEFAULT_DISPATCH_SPINS,
            max_filesystems: DEFAULT_MAX_FILESYSTEMS,
        }
    }

    /// Load overrides from the environment
    ///
    /// Environment variables:
    /// - SIGCOORD_IGNORE_SIGPIPE: `0`/`false` leaves SIGPIPE alone (default: true)
    /// - SIGCOORD_DISPATCH_SPINS: lock spins before yielding (default: 64)
    /// - SIGCOORD_MAX_FILESYSTEMS: registry capacity (default: 4096)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(flag) = env_bool("SIGCOORD_IGNORE_SIGPIPE") {
            config.ignore_broken_pipe = flag;
        }
        if let Some(spins) = env_parse::<u32>("SIGCOORD_DISPATCH_SPINS") {
            config.dispatch_spin_limit = spins.min(MAX_DISPATCH_SPINS);
        }
        if let Some(max) = env_parse::<usize>("SIGCOORD_MAX_FILESYSTEMS") {
            config.max_filesystems = max;
        }

        config
    }
}

/// Demo host configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Number of demo filesystems to mount
    pub filesystems: usize,
    /// Stop-flag poll interval of every session loop
    pub poll_interval: Duration,
    pub coordinator: CoordinatorConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            filesystems: DEFAULT_HOST_FILESYSTEMS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            coordinator: CoordinatorConfig::default(),
        }
    }
}

impl HostConfig {
    /// Environment variables:
    /// - SIGCOORD_FILESYSTEMS: demo filesystems to mount (default: 2)
    /// - SIGCOORD_POLL_MS: session poll interval in milliseconds (default: 50)
    pub fn from_env() -> Self {
        let mut config = Self {
            coordinator: CoordinatorConfig::from_env(),
            ..Self::default()
        };

        if let Some(count) = env_parse::<usize>("SIGCOORD_FILESYSTEMS") {
            config.filesystems = count.clamp(1, MAX_HOST_FILESYSTEMS);
        }
        if let Some(ms) = env_parse::<u64>("SIGCOORD_POLL_MS") {
            config.poll_interval = Duration::from_millis(ms).max(MIN_POLL_INTERVAL);
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim(), "1" | "true" | "yes" | "on"))
}
