//! Plain HTTP fetch primitive used for robots.txt and instance info.

use async_trait::async_trait;
use url::Url;

use crate::error::FetchResult;

/// A fetched response body with its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchedResponse {
    /// A 200 response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: None,
            body: body.into(),
        }
    }

    /// An empty response with the given status.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: String::new(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the server labelled the body as an HTML page.
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref().is_some_and(|content_type| {
            let content_type = content_type.to_ascii_lowercase();
            content_type.starts_with("text/html") || content_type.starts_with("application/xhtml")
        })
    }
}

/// Issues GET requests.
///
/// Non-2xx statuses are returned as responses, not errors; only transport
/// failures are `Err`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &Url) -> FetchResult<FetchedResponse>;
}
