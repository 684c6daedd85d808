//! Application setup and server configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{extract::Extension, http::Method, routing::get, Router};
use fxfedi::{ActivityPubClient, HttpFetcher, MetadataPipeline};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::config::Config;
use crate::server::routes::{health_handler, metadata_handler, oembed_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<MetadataPipeline>,
    /// Public URL of this service, used to build oEmbed links
    pub public_url: Url,
}

impl AppState {
    pub fn new(pipeline: MetadataPipeline, public_url: Url) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            public_url,
        }
    }

    /// Wire the reqwest-backed collaborators from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let pipeline_config = config.pipeline_config();

        let federation = ActivityPubClient::from_config(&pipeline_config)
            .context("Failed to create federation client")?;
        let fetcher =
            HttpFetcher::from_config(&pipeline_config).context("Failed to create HTTP fetcher")?;

        let pipeline = MetadataPipeline::new(Arc::new(federation), Arc::new(fetcher), pipeline_config);
        Ok(Self::new(pipeline, config.federation_url.clone()))
    }

    /// `{public_url}/oembed?uri={url}`
    pub fn oembed_url(&self, url: &Url) -> Url {
        let mut endpoint = self.public_url.clone();
        endpoint.set_path("/oembed");
        endpoint.set_fragment(None);
        endpoint
            .query_pairs_mut()
            .clear()
            .append_pair("uri", url.as_str());
        endpoint
    }
}

/// Build the Axum application router
pub fn build_app(state: AppState) -> Router {
    // Link unfurlers fetch from anywhere
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/oembed", get(oembed_handler))
        .route("/*url", get(metadata_handler))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
