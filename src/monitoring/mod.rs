/*!
 * Monitoring
 * Structured tracing for coordinator operations
 */

mod tracer;

pub use tracer::{generate_trace_id, init_tracing, OperationSpan};
