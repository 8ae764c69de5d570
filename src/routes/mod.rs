// HTTP routes: Prometheus scrape endpoint plus version info

mod http;

use axum::{Router, routing::get};
use prometheus::Registry;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) registry: Registry,
    pub(crate) config: AppConfig,
}

pub fn app(registry: Registry, config: AppConfig) -> Router {
    let metrics_path = config.server.metrics_path.clone();
    let state = AppState { registry, config };
    Router::new()
        .route("/", get(http::root_handler)) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route(&metrics_path, get(http::metrics_handler)) // GET /metrics
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
