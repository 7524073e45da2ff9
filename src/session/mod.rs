/*!
 * Session Runtime
 * Filesystem session loops driven by a signal-safe stop flag
 */

mod flag;
mod runner;

pub use flag::StopFlag;
pub use runner::{remove_signal_handlers, set_signal_handlers, Session, SessionExit};
