//! `GET /api/search?query=...&page=N` — movie catalog search.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::context::AppContext;
use crate::error::ApiError;
use crate::routes::forward;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_page")]
    pub page: String,
}

fn default_page() -> String {
    "1".to_string()
}

// An empty query is forwarded as-is; TMDB answers it with its own error
// body and that is what the UI expects to see.
pub async fn handle(
    State(ctx): State<AppContext>, Query(params): Query<SearchParams>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let up = ctx.tmdb()?.search(&params.query, &params.page).await?;
    Ok(forward(up))
}
