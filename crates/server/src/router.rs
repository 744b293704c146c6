use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes;
use crate::state::AppState;

/// Largest accepted request body. Camera snapshots are well below this.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Builds the full application router. Shared by `main.rs` and the
/// integration tests so both run the same middleware stack.
pub fn build_app_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::detect::router())
        .merge(routes::violations::router())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        // The exam page posts from its own origin.
        .layer(CorsLayer::permissive())
        .with_state(state)
}
