//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
  routing::{get, post},
  Router,
};
use tower_http::{
  cors::{Any, CorsLayer},
  services::{ServeDir, ServeFile},
  trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::static_dir_from_env;
use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket practice sessions at `/ws`
/// - JSON API under `/api/...`
/// - Static SPA from STATIC_DIR with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
  let static_dir = static_dir_from_env();
  let static_service = ServeDir::new(&static_dir)
    .append_index_html_on_directories(true)
    .not_found_service(ServeFile::new(format!("{static_dir}/index.html")));

  Router::new()
    // WebSocket
    .route("/ws", get(ws::ws_upgrade))
    // Editor support
    .route("/api/health", get(http::http_health))
    .route("/api/validate", post(http::http_validate))
    .route("/api/preview", post(http::http_preview))
    .route("/api/templates", get(http::http_templates))
    .route("/api/snippets", get(http::http_snippets))
    // Examples
    .route("/api/examples", get(http::http_list_examples))
    .route("/api/examples/:id", get(http::http_get_example))
    // Challenges
    .route("/api/challenges", get(http::http_list_challenges))
    .route("/api/challenges/:id", get(http::http_get_challenge))
    .route("/api/challenges/:id/check", post(http::http_check_challenge))
    // Accounts
    .route("/api/register", post(http::http_register))
    .route("/api/login", post(http::http_login))
    .route("/api/logout", post(http::http_logout))
    .route("/api/user", get(http::http_current_user))
    // Saved work
    .route("/api/saved-work", post(http::http_save_work))
    .route(
      "/api/saved-work/:id",
      get(http::http_get_saved_work).delete(http::http_delete_saved_work),
    )
    .route("/api/user/saved-work", get(http::http_user_saved_work))
    // State + CORS + HTTP tracing
    .with_state(state)
    .layer(
      CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any),
    )
    .layer(
      TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
    // Frontend fallback
    .fallback_service(static_service)
}
