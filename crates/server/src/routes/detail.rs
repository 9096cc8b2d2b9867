//! `GET /api/movie?id=...&type=movie|tv` — detail for a single title.

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
pub struct DetailParams {
    #[serde(default)]
    pub id: String,
    /// `tv` selects the TV catalog; any other value means movie.
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
}

pub async fn handle(
    State(ctx): State<AppContext>, Query(params): Query<DetailParams>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let tmdb = ctx.tmdb()?;
    if params.id.is_empty() {
        return Err(ApiError::missing_input("Missing id"));
    }

    let media = MediaType::from_param(params.media_type.as_deref());
    let up = tmdb.detail(media, &params.id).await?;
    Ok(forward(up))
}
