use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{auth, AppState};

pub mod assistant;
pub mod handlers;

/// Build the full application router.
///
/// Everything except the health check and login sits behind the bearer
/// middleware; brand isolation is enforced per handler on top of that.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/ranking", get(handlers::brand_ranking))
        .route("/assistant/query", post(assistant::query))
        .route("/:brand/summary", get(handlers::brand_summary))
        .route(
            "/:brand/engine/temp-performance",
            get(handlers::engine_temp_performance),
        )
        .route(
            "/:brand/engine/distribution",
            get(handlers::engine_distribution),
        )
        .route("/:brand/engine/risk", get(handlers::engine_risk))
        .route(
            "/:brand/battery/temp-performance",
            get(handlers::battery_temp_performance),
        )
        .route(
            "/:brand/battery/distribution",
            get(handlers::battery_distribution),
        )
        .route("/:brand/battery/risk", get(handlers::battery_risk))
        .route(
            "/:brand/brakes/temp-performance",
            get(handlers::brake_temp_performance),
        )
        .route(
            "/:brand/brakes/wear-distribution",
            get(handlers::brake_wear_distribution),
        )
        .route("/:brand/brakes/risk", get(handlers::brake_risk))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/auth/login", post(handlers::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
