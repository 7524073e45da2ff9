/*!
 * Coordinator Limits and Constants
 *
 * Centralized location for tunables and magic numbers used by the
 * coordinator, the session runtime and the demo host.
 */

use std::time::Duration;

// =============================================================================
// DISPATCH
// =============================================================================

/// Busy-spins on the registry lock before the dispatch path starts yielding.
/// The dispatch path runs in signal context and cannot park.
pub const DEFAULT_DISPATCH_SPINS: u32 = 64;

/// Upper bound accepted from configuration for dispatch spins
pub const MAX_DISPATCH_SPINS: u32 = 1 << 16;

/// Initial registry capacity reserved on first registration
pub const INITIAL_REGISTRY_CAPACITY: usize = 4;

/// Filesystems the registry accepts before registration fails
pub const DEFAULT_MAX_FILESYSTEMS: usize = 4096;

// =============================================================================
// SESSION RUNTIME
// =============================================================================

/// Default stop-flag poll interval for session loops
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Shortest poll interval accepted from configuration
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

// =============================================================================
// HOST
// =============================================================================

/// Number of demo filesystems the host binary mounts by default
pub const DEFAULT_HOST_FILESYSTEMS: usize = 2;

/// Maximum demo filesystems the host binary accepts
pub const MAX_HOST_FILESYSTEMS: usize = 256;
