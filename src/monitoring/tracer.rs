/*!
 * Structured Tracing
 * Subscriber setup and operation spans using the tracing crate
 */

use std::time::Instant;
use tracing::{debug, info, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Operations slower than this are logged at warn
const SLOW_OPERATION_MS: u128 = 10;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SIGCOORD_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("SIGCOORD_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    match result {
        Ok(()) => info!(json = use_json, "Structured tracing initialized"),
        Err(e) => eprintln!("tracing already initialized: {}", e),
    }
}

/// Generate a unique trace ID for request correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span around a coordinator operation, logging its duration on drop
///
/// Never create one in signal context: it allocates.
pub struct OperationSpan {
    span: Span,
    start: Instant,
    operation: &'static str,
    trace_id: String,
}

impl OperationSpan {
    pub fn new(operation: &'static str) -> Self {
        let trace_id = generate_trace_id();
        let span = span!(
            Level::DEBUG,
            "coordinator",
            trace_id = %trace_id,
            operation = operation,
            duration_us = tracing::field::Empty,
            error = tracing::field::Empty,
        );
        Self {
            span,
            start: Instant::now(),
            operation,
            trace_id,
        }
    }

    pub fn record_error(&self, error: &str) {
        self.span.record("error", error);
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("duration_us", duration.as_micros() as u64);
        let _entered = self.span.enter();

        if duration.as_millis() > SLOW_OPERATION_MS {
            warn!(
                trace_id = %self.trace_id,
                operation = self.operation,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow coordinator operation"
            );
        } else {
            debug!(
                trace_id = %self.trace_id,
                operation = self.operation,
                duration_us = duration.as_micros() as u64,
                "coordinator operation completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_ids_are_unique() {
        assert_ne!(generate_trace_id(), generate_trace_id());
    }

    #[test]
    fn test_span_enters_and_records() {
        let span = OperationSpan::new("test");
        {
            let _entered = span.enter();
            span.record_error("boom");
        }
        drop(span);
    }
}
