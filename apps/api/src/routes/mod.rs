pub mod health;

use axum::{routing::get, routing::post, Router};

use crate::recommendation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/recommendations",
            post(handlers::handle_recommend),
        )
        .route(
            "/api/v1/recommendations/interpret",
            post(handlers::handle_interpret),
        )
        .route(
            "/api/v1/recommendations/refine",
            post(handlers::handle_refine),
        )
        .with_state(state)
}
