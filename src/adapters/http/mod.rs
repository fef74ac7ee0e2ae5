pub mod error;
pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::adapters::http::state::HttpState;

pub fn router(state: HttpState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/api/weights", get(routes::list_weights))
        .route("/api/upload", post(routes::upload))
        .route("/api/detect", post(routes::detect))
        .route("/api/results/*path", get(routes::get_result))
        .route("/api/uploads/:name", get(routes::get_upload))
        .route("/api/health", get(routes::health))
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
