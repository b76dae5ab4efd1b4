// ── Error sink ──
//
// Every failed operation passes through the sink exactly once before
// the error is returned to the caller, so hosts get one place for
// logging/telemetry without losing their own error handling.
// Implementations must not panic; the runners do not catch panics
// raised inside the sink.

use pagekit_api::{EffectiveRequest, Error};
use tracing::error;

use crate::operation::Operation;

/// Receives every operation failure. Injected at construction.
pub trait ErrorSink: Send + Sync {
    /// `request` is `None` when the failure happened before a request
    /// could be merged (e.g. a missing template).
    fn handle(&self, err: &Error, operation: Operation, request: Option<&EffectiveRequest>);
}

/// Default sink: structured log of the failure's message and status.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn handle(&self, err: &Error, operation: Operation, request: Option<&EffectiveRequest>) {
        error!(
            operation = operation.name(),
            status = ?err.status(),
            url = request.and_then(|r| r.url.as_deref()),
            error = %err,
            "operation failed"
        );
    }
}
