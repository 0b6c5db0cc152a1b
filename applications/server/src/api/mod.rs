/// API route modules
pub mod authorize;
pub mod health;

use crate::realtime::ws;
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Build the application router
pub fn router(app_state: AppState) -> Router {
    let api_routes = Router::new().route("/health", get(health::health));

    Router::new()
        .nest("/api", api_routes)
        .route("/login", get(authorize::login))
        .route("/callback", get(authorize::callback))
        .route("/ws", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
