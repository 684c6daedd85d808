//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the pipeline without
//! making real network calls. Clones share state, so a test can keep a handle
//! for assertions after moving a mock into the pipeline.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

use crate::error::{FederationError, FederationResult, FetchError, FetchResult};
use crate::traits::federation::FederationClient;
use crate::traits::fetcher::{FetchedResponse, Fetcher};
use crate::types::object::RemoteObject;

fn connection_refused() -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "Mock connection refused",
    ))
}

/// A mock HTTP fetcher.
///
/// Unknown URLs answer 404.
#[derive(Clone, Default)]
pub struct MockFetcher {
    /// Predefined responses by URL
    responses: Arc<RwLock<HashMap<String, FetchedResponse>>>,

    /// URLs that should fail
    fail_urls: Arc<RwLock<Vec<String>>>,

    /// Artificial latency before every answer
    delay: Option<Duration>,

    /// Call tracking
    requested: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predefined response.
    pub fn with_response(self, url: impl Into<String>, response: FetchedResponse) -> Self {
        self.responses.write().unwrap().insert(url.into(), response);
        self
    }

    /// Add a 200 text response.
    pub fn with_body(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.with_response(url, FetchedResponse::ok(body).with_content_type("text/plain"))
    }

    /// Add a 200 JSON response.
    pub fn with_json(self, url: impl Into<String>, value: serde_json::Value) -> Self {
        self.with_response(
            url,
            FetchedResponse::ok(value.to_string()).with_content_type("application/json"),
        )
    }

    /// Mark a URL as failing at the transport level.
    pub fn with_failure(self, url: impl Into<String>) -> Self {
        self.fail_urls.write().unwrap().push(url.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.read().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn get(&self, url: &Url) -> FetchResult<FetchedResponse> {
        self.requested.write().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_urls.read().unwrap().contains(&url.to_string()) {
            return Err(FetchError::Http(connection_refused()));
        }

        Ok(self
            .responses
            .read()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| FetchedResponse::status(404)))
    }
}

/// A mock federation client.
///
/// Unknown URLs resolve to `Ok(None)`.
#[derive(Clone, Default)]
pub struct MockFederationClient {
    /// Predefined objects by URL
    objects: Arc<RwLock<HashMap<String, RemoteObject>>>,

    /// URLs that should fail
    fail_urls: Arc<RwLock<Vec<String>>>,

    /// Artificial latency before every answer
    delay: Option<Duration>,

    /// Call tracking
    requested: Arc<RwLock<Vec<String>>>,
}

impl MockFederationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predefined object.
    pub fn with_object(self, url: impl Into<String>, object: RemoteObject) -> Self {
        self.objects.write().unwrap().insert(url.into(), object);
        self
    }

    /// Mark a URL as failing at the transport level.
    pub fn with_failure(self, url: impl Into<String>) -> Self {
        self.fail_urls.write().unwrap().push(url.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs looked up so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.read().unwrap().clone()
    }
}

#[async_trait]
impl FederationClient for MockFederationClient {
    async fn resolve_object(&self, url: &Url) -> FederationResult<Option<RemoteObject>> {
        self.requested.write().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_urls.read().unwrap().contains(&url.to_string()) {
            return Err(FederationError::Http(connection_refused()));
        }

        Ok(self.objects.read().unwrap().get(url.as_str()).cloned())
    }
}
