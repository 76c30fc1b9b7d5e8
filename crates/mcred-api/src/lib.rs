//! # mcred-api: Micro-Credential Registry HTTP Service
//!
//! Axum services for registering institutions and their micro-credentials,
//! recording which institutions recognize which credentials, and managing
//! credit-transfer pathways between institutions.
//!
//! ## API Surface
//!
//! | Prefix               | Module                      | Domain              |
//! |----------------------|-----------------------------|---------------------|
//! | `/api/institutions*` | [`routes::institutions`]    | Providers           |
//! | `/api/credentials*`  | [`routes::credentials`]     | Micro-credentials   |
//! | `/api/recognitions*` | [`routes::recognitions`]    | Recognitions        |
//! | `/api/pathways*`     | [`routes::pathways`]        | Pathways            |
//! | `/metrics`           | [`middleware::metrics`]     | Counters            |
//! | `/openapi.json`      | [`openapi`]                 | API description     |
//! | `/health*`           | this module                 | Probes              |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::auth::AuthConfig;
use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health*`) are mounted outside the auth and metrics
/// middleware so probes neither need credentials nor skew the counters.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let metrics = ApiMetrics::new();

    let api = Router::new()
        .merge(routes::institutions::router())
        .merge(routes::credentials::router())
        .merge(routes::recognitions::router())
        .merge(routes::pathways::router())
        .merge(middleware::metrics::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .layer(axum::Extension(auth_config))
        .layer(axum::Extension(metrics))
        .with_state(state.clone());

    let health = Router::new()
        .route("/health", get(health))
        .route("/health/liveness", get(liveness))
        .with_state(state);

    Router::new().merge(health).merge(api)
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    database: &'static str,
}

/// Readiness: 200 while the database answers (or none is configured),
/// 503 when the configured database does not.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthBody>) {
    let Some(pool) = &state.db_pool else {
        return (
            StatusCode::OK,
            Json(HealthBody {
                status: "healthy",
                database: "in-memory",
            }),
        );
    };

    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthBody {
                status: "healthy",
                database: "connected",
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check: database unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthBody {
                    status: "unhealthy",
                    database: "disconnected",
                }),
            )
        }
    }
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}
