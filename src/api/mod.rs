pub mod error;
pub mod forecast;
pub mod health;
pub mod models;
pub mod predict;
pub mod summary;

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::Config;

/// Initialization-time request context: the loaded configuration, nothing
/// else. Model artifacts are read from disk per request.
#[derive(Clone)]
pub struct ApiContext {
    pub cfg: Config,
}

impl ApiContext {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }
}

pub fn router(ctx: ApiContext) -> Router {
    let enable_cors = ctx.cfg.server.enable_cors;
    let timeout = Duration::from_secs(ctx.cfg.server.request_timeout_secs);

    let mut router = Router::new()
        .route("/health", get(health::health))
        .route("/models", get(models::list_models))
        .route("/metrics/summary", get(summary::metrics_summary))
        .route("/predict", post(predict::predict))
        .route("/forecast", post(forecast::forecast))
        .with_state(ctx);

    if enable_cors {
        use tower_http::cors::Any;
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
                .layer(TimeoutLayer::new(timeout)),
        )
        .layer(TraceLayer::new_for_http())
}
