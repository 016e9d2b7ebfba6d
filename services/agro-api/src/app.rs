use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(crate::routes_info::root))
        .route("/health", get(crate::routes_info::health))
        .route("/chat", post(crate::routes_chat::chat))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
