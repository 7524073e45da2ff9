/*!
 * Core Module
 * Error handling, configuration and limits shared by the coordinator
 */

pub mod config;
pub mod errors;
pub mod limits;

// Re-export for convenience
pub use config::{CoordinatorConfig, HostConfig};
pub use errors::*;
