//! `GET /api/videos?id=...&type=movie|tv` — trailers for a single title.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use reelgate_client::MediaType;

use crate::context::AppContext;
use crate::error::ApiError;
use crate::routes::forward;

#[derive(Debug, Deserialize)]
pub struct VideosParams {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
}

pub async fn handle(
    State(ctx): State<AppContext>, Query(params): Query<VideosParams>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if params.id.is_empty() {
        return Err(ApiError::missing_input("Missing id"));
    }

    let media = MediaType::from_param(params.media_type.as_deref());
    let up = ctx.tmdb()?.videos(media, &params.id).await?;
    Ok(forward(up))
}
