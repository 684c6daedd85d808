use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, Uri},
    Json,
};
use fxfedi::{normalize, robots_disallowed_tags, to_tags, Metadata, ResolveError, Tag};
use serde::Serialize;
use url::Url;

use super::user_agent;
use crate::server::app::AppState;
use crate::server::error::ApiResult;

/// Preview document for one post
#[derive(Debug, Serialize)]
pub struct MetadataResponse {
    pub url: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oembed_url: Option<Url>,
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Metadata endpoint: `GET /<post url>`
///
/// The post URL is taken verbatim from the path, so garbled schemes such as
/// `/https:/example.social/@alice/1` are accepted.
pub async fn metadata_handler(
    Extension(state): Extension<AppState>,
    Path(path): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> ApiResult<Json<MetadataResponse>> {
    let raw = match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    };
    let url = normalize(&raw)?;

    let agents: Vec<&str> = user_agent(&headers).into_iter().collect();
    match state.pipeline.resolve_normalized(&url, &agents).await {
        Ok(metadata) => Ok(Json(MetadataResponse {
            url: url.as_url().clone(),
            oembed_url: Some(state.oembed_url(&url)),
            tags: to_tags(&metadata),
            metadata: Some(metadata),
        })),
        Err(ResolveError::RobotsDisallowed { .. }) => Ok(Json(MetadataResponse {
            url: url.into_url(),
            oembed_url: None,
            tags: robots_disallowed_tags(),
            metadata: None,
        })),
        Err(e) => Err(e.into()),
    }
}
