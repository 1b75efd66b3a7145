//! Request-scoped context
//!
//! Every call into a provider, resource or data source receives a `Context`
//! identifying the host request it serves. Log lines emitted inside
//! `ctx.span()` carry the request id and operation name.

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Context carries request-scoped values
/// Pass this as first parameter to all async trait methods
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    request_id: u64,
    operation: String,
    started: Instant,
    span: tracing::Span,
}

impl Context {
    pub fn new() -> Self {
        Self::for_request(0, "local")
    }

    pub fn for_request(request_id: u64, operation: &str) -> Self {
        let span = tracing::info_span!("request", id = request_id, op = operation);

        Self {
            inner: Arc::new(ContextInner {
                request_id,
                operation: operation.to_string(),
                started: Instant::now(),
                span,
            }),
        }
    }

    pub fn request_id(&self) -> u64 {
        self.inner.request_id
    }

    pub fn operation(&self) -> &str {
        &self.inner.operation
    }

    pub fn span(&self) -> &tracing::Span {
        &self.inner.span
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.started.elapsed()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
