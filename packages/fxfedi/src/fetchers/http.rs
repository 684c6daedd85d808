//! reqwest-backed [`Fetcher`].

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::security::{build_client, send_validated, RequestError, UrlValidator};
use crate::traits::fetcher::{FetchedResponse, Fetcher};
use crate::types::config::PipelineConfig;

/// HTTP fetcher for robots.txt and instance-info requests.
///
/// # Example
///
/// ```rust,ignore
/// use fxfedi::{HttpFetcher, PipelineConfig};
///
/// let fetcher = HttpFetcher::from_config(&PipelineConfig::default())?;
/// let response = fetcher.get(&"https://example.social/robots.txt".parse()?).await?;
/// ```
pub struct HttpFetcher {
    client: reqwest::Client,
    validator: UrlValidator,
}

impl HttpFetcher {
    /// Create a fetcher with the given user agent and per-request timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> FetchResult<Self> {
        let client =
            build_client(user_agent, timeout).map_err(|e| FetchError::Http(Box::new(e)))?;

        Ok(Self {
            client,
            validator: UrlValidator::new(),
        })
    }

    /// Create a fetcher using the pipeline's user agent and the longer of its
    /// robots and instance timeouts.
    pub fn from_config(config: &PipelineConfig) -> FetchResult<Self> {
        let timeout = config.robots_timeout().max(config.instance_timeout());
        Ok(Self::new(&config.user_agent, timeout)?
            .with_validator(UrlValidator::for_private_access(config.allow_private_address)))
    }

    /// Replace the URL validator.
    pub fn with_validator(mut self, validator: UrlValidator) -> Self {
        self.validator = validator;
        self
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &Url) -> FetchResult<FetchedResponse> {
        debug!(url = %url, "HTTP fetch starting");
        let response = send_validated(&self.client, &self.validator, url, None)
            .await
            .map_err(|e| match e {
                RequestError::Security(e) => {
                    warn!(url = %url, error = %e, "Blocked outbound fetch");
                    FetchError::Security(e)
                }
                RequestError::Transport(e) => {
                    warn!(url = %url, error = %e, "HTTP request failed");
                    if e.is_timeout() {
                        FetchError::Timeout {
                            url: url.to_string(),
                        }
                    } else {
                        FetchError::Http(Box::new(e))
                    }
                }
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        debug!(url = %url, status, body_len = body.len(), "HTTP fetch finished");

        Ok(FetchedResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SecurityError;

    #[tokio::test]
    async fn test_rejects_private_targets_before_sending() {
        let fetcher = HttpFetcher::new("fxfedi/test", Duration::from_secs(1)).unwrap();
        let url = Url::parse("http://127.0.0.1:9/robots.txt").unwrap();

        let err = fetcher.get(&url).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Security(SecurityError::BlockedCidr(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_mapped_loopback_before_sending() {
        let fetcher = HttpFetcher::new("fxfedi/test", Duration::from_secs(1)).unwrap();

        for target in [
            "http://[::ffff:127.0.0.1]:9/api/v1/instance",
            "http://localhost.:9/robots.txt",
        ] {
            let err = fetcher.get(&Url::parse(target).unwrap()).await.unwrap_err();
            assert!(
                matches!(err, FetchError::Security(_)),
                "{target} should be blocked, got {err:?}"
            );
        }
    }
}
