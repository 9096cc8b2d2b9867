//! Proxy routes for the TMDB metadata API.
//!
//! One file per endpoint, all read-only GET, all pass-through: the
//! upstream's status code and JSON body are forwarded verbatim, and
//! failures become `{ "error": … }` bodies. Everything that misses these
//! routes falls through to the gateway adapter.

pub mod detail;
pub mod genres;
pub mod search;
pub mod trending;
pub mod videos;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use serde_json::Value;

use reelgate_client::Upstream;

use crate::context::AppContext;
use crate::gateway;

/// Build the application router: proxy endpoints first, gateway fallback
/// for everything else.
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/api/search", get(search::handle))
        .route("/api/trending", get(trending::handle))
        .route("/api/movie", get(detail::handle))
        .route("/api/videos", get(videos::handle))
        .route("/api/genres", get(genres::handle))
        .fallback(gateway::handle)
        .with_state(ctx)
}

/// Forward the upstream's own status code and JSON body.
pub(crate) fn forward(up: Upstream) -> (StatusCode, Json<Value>) {
    let status = StatusCode::from_u16(up.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(up.body))
}
