//! Unsigned ActivityStreams object lookup over reqwest.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::json::decode_object;
use crate::error::{FederationError, FederationResult};
use crate::security::{build_client, send_validated, RequestError, UrlValidator};
use crate::traits::federation::FederationClient;
use crate::types::config::PipelineConfig;
use crate::types::object::RemoteObject;

const ACTIVITY_ACCEPT: &str = "application/activity+json, \
     application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\";q=0.9, \
     text/html;q=0.1";

const ALTERNATE_LINK: &str =
    r#"link[rel="alternate"][type="application/activity+json"], link[rel="alternate"][type^="application/ld+json"]"#;

/// A fetched document before decoding.
struct Document {
    final_url: Url,
    content_type: String,
    body: String,
}

impl Document {
    fn is_html(&self) -> bool {
        self.content_type.starts_with("text/html")
            || self.content_type.starts_with("application/xhtml")
    }
}

/// Federation client that fetches objects with an ActivityStreams `Accept`
/// header.
///
/// When a server answers with an HTML page instead, the page's
/// `rel="alternate"` ActivityStreams link is followed once.
pub struct ActivityPubClient {
    client: reqwest::Client,
    validator: UrlValidator,
}

impl ActivityPubClient {
    /// Create a client with the given user agent and per-request timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> FederationResult<Self> {
        let client = build_client(user_agent, timeout)
            .map_err(|e| FederationError::Http(Box::new(e)))?;

        Ok(Self {
            client,
            validator: UrlValidator::new(),
        })
    }

    /// Create a client from the pipeline config.
    pub fn from_config(config: &PipelineConfig) -> FederationResult<Self> {
        Ok(Self::new(&config.user_agent, config.object_timeout())?
            .with_validator(UrlValidator::for_private_access(config.allow_private_address)))
    }

    /// Replace the URL validator.
    pub fn with_validator(mut self, validator: UrlValidator) -> Self {
        self.validator = validator;
        self
    }

    /// GET `url`; `Ok(None)` on 404/410.
    async fn fetch(&self, url: &Url) -> FederationResult<Option<Document>> {
        debug!(url = %url, "Fetching ActivityStreams object");
        let response = send_validated(&self.client, &self.validator, url, Some(ACTIVITY_ACCEPT))
            .await
            .map_err(|e| match e {
                RequestError::Security(e) => {
                    warn!(url = %url, error = %e, "Blocked object lookup");
                    FederationError::Security(e)
                }
                RequestError::Transport(e) => {
                    warn!(url = %url, error = %e, "Object request failed");
                    if e.is_timeout() {
                        FederationError::Timeout {
                            url: url.to_string(),
                        }
                    } else {
                        FederationError::Http(Box::new(e))
                    }
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            debug!(url = %url, status = status.as_u16(), "Object not found");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FederationError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
        let body = response
            .text()
            .await
            .map_err(|e| FederationError::Http(Box::new(e)))?;

        Ok(Some(Document {
            final_url,
            content_type,
            body,
        }))
    }

    fn decode(document: &Document) -> FederationResult<RemoteObject> {
        let value: serde_json::Value = serde_json::from_str(&document.body)
            .map_err(|e| FederationError::Decode(e.to_string()))?;
        decode_object(value)
    }
}

/// Find the ActivityStreams alternate link of an HTML page.
fn find_alternate_link(base: &Url, html: &str) -> Option<Url> {
    let selector = Selector::parse(ALTERNATE_LINK).ok()?;
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|link| link.value().attr("href"))
        .find_map(|href| base.join(href).ok())
}

#[async_trait]
impl FederationClient for ActivityPubClient {
    async fn resolve_object(&self, url: &Url) -> FederationResult<Option<RemoteObject>> {
        let Some(document) = self.fetch(url).await? else {
            return Ok(None);
        };

        if !document.is_html() {
            return Self::decode(&document).map(Some);
        }

        let Some(alternate) = find_alternate_link(&document.final_url, &document.body) else {
            debug!(url = %url, "HTML page without an ActivityStreams alternate");
            return Ok(None);
        };

        debug!(url = %url, alternate = %alternate, "Following ActivityStreams alternate link");
        match self.fetch(&alternate).await? {
            Some(document) if !document.is_html() => Self::decode(&document).map(Some),
            _ => Ok(None),
        }
    }
}
