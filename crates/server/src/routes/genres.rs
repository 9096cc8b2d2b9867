//! `GET /api/genres` — merged movie and TV genre list.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::Value;

use crate::context::AppContext;
use crate::error::ApiError;
use crate::routes::forward;

pub async fn handle(State(ctx): State<AppContext>) -> Result<(StatusCode, Json<Value>), ApiError> {
    let up = ctx.tmdb()?.genres().await?;
    Ok(forward(up))
}
