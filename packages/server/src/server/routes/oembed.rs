use axum::{
    extract::{Extension, Query},
    http::HeaderMap,
    Json,
};
use fxfedi::{normalize, to_oembed, OEmbed};
use serde::Deserialize;

use super::user_agent;
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct OEmbedParams {
    uri: Option<String>,
}

/// oEmbed endpoint: `GET /oembed?uri=<post url>`
pub async fn oembed_handler(
    Extension(state): Extension<AppState>,
    Query(params): Query<OEmbedParams>,
    headers: HeaderMap,
) -> ApiResult<Json<OEmbed>> {
    let raw = params
        .uri
        .filter(|uri| !uri.trim().is_empty())
        .ok_or(ApiError::MissingParameter("uri"))?;
    let url = normalize(&raw)?;

    let agents: Vec<&str> = user_agent(&headers).into_iter().collect();
    let metadata = state.pipeline.resolve_normalized(&url, &agents).await?;

    Ok(Json(to_oembed(&metadata, &url)))
}
