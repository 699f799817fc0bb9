//! File server hit counter

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Count of requests served under `/app`. Cloning shares the counter.
#[derive(Debug, Clone, Default)]
pub struct RequestMetrics {
    file_server_hits: Arc<AtomicU64>,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.file_server_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.file_server_hits.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.file_server_hits.store(0, Ordering::Relaxed);
    }
}

/// Middleware that counts every request it sees before passing it on
pub async fn count_hits(
    State(metrics): State<RequestMetrics>,
    request: Request,
    next: Next,
) -> Response {
    metrics.increment();
    next.run(request).await
}
