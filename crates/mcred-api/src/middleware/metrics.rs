//! # Request Metrics
//!
//! Lightweight in-process counters using atomics, exposed as JSON at
//! `GET /metrics` together with the current size of each store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Shared metrics state.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    request_count: Arc<AtomicU64>,
    client_error_count: Arc<AtomicU64>,
    server_error_count: Arc<AtomicU64>,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// 4xx responses.
    pub fn client_errors(&self) -> u64 {
        self.client_error_count.load(Ordering::Relaxed)
    }

    /// 5xx responses.
    pub fn server_errors(&self) -> u64 {
        self.server_error_count.load(Ordering::Relaxed)
    }

    fn record(&self, status: axum::http::StatusCode) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        if status.is_client_error() {
            self.client_error_count.fetch_add(1, Ordering::Relaxed);
        } else if status.is_server_error() {
            self.server_error_count.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Middleware that counts every response by status class.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.record(response.status());
    }

    response
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub institutions: usize,
    pub credentials: usize,
    pub recognitions: usize,
    pub pathways: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_snapshot))
}

/// GET /metrics: Counters since process start and current store sizes.
async fn metrics_snapshot(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> Json<MetricsSnapshot> {
    Json(MetricsSnapshot {
        requests: metrics.requests(),
        client_errors: metrics.client_errors(),
        server_errors: metrics.server_errors(),
        institutions: state.institutions.len(),
        credentials: state.credentials.len(),
        recognitions: state.recognitions.len(),
        pathways: state.pathways.len(),
    })
}
