pub mod api;
pub mod reply;
pub mod state;
pub mod ws;

use std::path::Path;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::http::state::AppState;

/// REST routes under `/api`, the event channel at `/ws`, and the web UI from
/// `web_root` (if any) for everything else.
pub fn build_router(state: AppState, web_root: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/api/version", get(api::version))
        .route("/api/movies", get(api::movies))
        .route("/api/current", get(api::current_movie))
        .route("/api/play/{movie}", post(api::play))
        .route("/api/stop", post(api::stop))
        .route("/api/command/{name}", post(api::command))
        .route("/api/disk", get(api::disk_space))
        .route("/api/download", post(api::download))
        .route("/ws", get(ws::ws_handler))
        .with_state(state);

    let router = match web_root {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };
    router.layer(TraceLayer::new_for_http())
}
