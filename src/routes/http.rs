// GET handlers: metrics scrape, version, index

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use super::AppState;
use crate::collectors;
use crate::version::{COMMIT_ID, NAME, VERSION};

/// GET /: points operators at the scrape path.
pub(super) async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    format!(
        "{} {}: metrics at {}\n",
        NAME, VERSION, state.config.server.metrics_path
    )
}

/// GET /version: service name, version and commit (fixed at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
        "commitId": COMMIT_ID,
    }))
}

/// GET /metrics: runs every collector. Collectors block on smbstatus, so the gather
/// runs on the blocking pool. Partial data loss never fails the scrape; only an
/// encoding failure does.
pub(super) async fn metrics_handler(State(state): State<AppState>) -> Response {
    let registry = state.registry.clone();
    let rendered = tokio::task::spawn_blocking(move || collectors::render(&registry)).await;
    match rendered {
        Ok(Ok(body)) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "metrics gather task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics gather failed").into_response()
        }
    }
}
