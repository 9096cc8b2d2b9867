//! `GET /api/trending?page=N` — the daily trending feed.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::context::AppContext;
use crate::error::ApiError;
use crate::routes::forward;

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
    #[serde(default = "default_page")]
    pub page: String,
}

fn default_page() -> String {
    "1".to_string()
}

pub async fn handle(
    State(ctx): State<AppContext>, Query(params): Query<TrendingParams>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let up = ctx.tmdb()?.trending(&params.page).await?;
    Ok(forward(up))
}
