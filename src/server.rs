//! HTTP surface for the matching service.
//!
//! Exposes the matching pipeline as a small JSON API for the rest of the
//! coaching backend to consume.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/match?query=<text>` | Match free text against the catalog |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `catalog_unavailable` (503),
//! `timeout` (504), `internal` (500). A single failed strategy never
//! surfaces here; it only degrades recall.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the browser UI calls
//! this service directly.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::catalog::{CatalogStore, SqliteCatalog};
use crate::config::Config;
use crate::db;
use crate::matcher;
use crate::models::MatchOutcome;

/// Shared application state passed to all route handlers.
///
/// The catalog handle is constructed once at startup and injected here,
/// so handlers never open connections of their own and tests can swap in
/// an in-memory catalog.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    catalog: Arc<dyn CatalogStore>,
}

/// Starts the HTTP server with a SQLite catalog from the configuration.
///
/// Binds to the address in `[server].bind` and runs until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let catalog = Arc::new(SqliteCatalog::new(pool, config.matching.upc_length));
    run_server_with_catalog(config, catalog).await
}

/// Starts the HTTP server against an explicit catalog implementation.
///
/// Like [`run_server`], but the catalog is supplied by the caller. Library
/// users embedding the service can pass a [`crate::catalog::MemoryCatalog`]
/// or their own [`CatalogStore`].
pub async fn run_server_with_catalog(
    config: &Config,
    catalog: Arc<dyn CatalogStore>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState {
        config: Arc::new(config.clone()),
        catalog,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/match", get(handle_match))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("match server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn catalog_unavailable(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::SERVICE_UNAVAILABLE,
        code: "catalog_unavailable".to_string(),
        message: message.into(),
    }
}

fn timeout_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::GATEWAY_TIMEOUT,
        code: "timeout".to_string(),
        message: message.into(),
    }
}

fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Maps pipeline errors to the most appropriate HTTP status code, keyed
/// off the error message so the matcher does not need its own error type.
fn classify_match_error(err: anyhow::Error) -> AppError {
    let msg = err.to_string();

    if msg.contains("must not be empty") || msg.contains("no searchable terms") {
        bad_request(msg)
    } else if msg.contains("catalog unavailable") {
        catalog_unavailable(msg)
    } else if msg.contains("timed out") {
        timeout_error(msg)
    } else {
        internal_error(msg)
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Handler for `GET /health`, used by load balancers and monitoring.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /match ============

#[derive(Deserialize)]
struct MatchParams {
    query: Option<String>,
}

/// Handler for `GET /match?query=<free text>`.
///
/// Returns the top candidate's UPC (or `null`), the distinct candidate
/// count, and the best three matches for diagnostics.
async fn handle_match(
    State(state): State<AppState>,
    Query(params): Query<MatchParams>,
) -> Result<Json<MatchOutcome>, AppError> {
    let raw = params.query.unwrap_or_default();
    if raw.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let outcome = matcher::run_match(
        state.catalog.as_ref(),
        &state.config.matching,
        &state.config.vocab,
        &raw,
    )
    .await
    .map_err(classify_match_error)?;

    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_classify_empty_query_as_bad_request() {
        let e = classify_match_error(anyhow!("query must not be empty"));
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.code, "bad_request");
    }

    #[test]
    fn test_classify_catalog_unavailable() {
        let e = classify_match_error(anyhow!("catalog unavailable: all 5 match strategies failed"));
        assert_eq!(e.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(e.code, "catalog_unavailable");
    }

    #[test]
    fn test_classify_timeout() {
        let e = classify_match_error(anyhow!("catalog query timed out"));
        assert_eq!(e.status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(e.code, "timeout");
    }

    #[test]
    fn test_classify_unknown_as_internal() {
        let e = classify_match_error(anyhow!("disk on fire"));
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.code, "internal");
    }
}
