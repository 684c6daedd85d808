//! Configuration for the metadata pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Crawler token the service announces in robots checks and its user agent.
pub const DEFAULT_CRAWLER_TOKEN: &str = "fxfedi";

/// Bio phrases that opt an author out of proxying.
pub const DEFAULT_OPT_OUT_PHRASES: &[&str] = &["#nobot", "#noproxy", "#nofxfedi"];

/// Configuration for [`crate::MetadataPipeline`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Robots token for this service, checked alongside the requester's.
    pub crawler_token: String,

    /// User-Agent header sent on every outbound request.
    pub user_agent: String,

    /// Budget for fetching robots.txt. Exceeding it means "no restrictions".
    pub robots_timeout_ms: u64,

    /// Budget for the instance-info lookup. Exceeding it means "no instance".
    pub instance_timeout_ms: u64,

    /// Budget for resolving the remote object. Exceeding it fails the request.
    pub object_timeout_ms: u64,

    /// Case-insensitive substrings of an actor bio that mean "do not proxy".
    pub opt_out_phrases: Vec<String>,

    /// Permit fetches to loopback and private ranges (development only).
    #[serde(default)]
    pub allow_private_address: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            crawler_token: DEFAULT_CRAWLER_TOKEN.to_string(),
            user_agent: format!("{}/{}", DEFAULT_CRAWLER_TOKEN, env!("CARGO_PKG_VERSION")),
            robots_timeout_ms: 10_000,
            instance_timeout_ms: 10_000,
            object_timeout_ms: 10_000,
            opt_out_phrases: DEFAULT_OPT_OUT_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            allow_private_address: false,
        }
    }
}

impl PipelineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the service's crawler token.
    pub fn with_crawler_token(mut self, token: impl Into<String>) -> Self {
        self.crawler_token = token.into();
        self
    }

    /// Set the outbound user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Use one timeout for every network step.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.robots_timeout_ms = ms;
        self.instance_timeout_ms = ms;
        self.object_timeout_ms = ms;
        self
    }

    /// Replace the opt-out phrases.
    pub fn with_opt_out_phrases(
        mut self,
        phrases: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.opt_out_phrases = phrases.into_iter().map(|p| p.into()).collect();
        self
    }

    /// Allow fetching private and loopback addresses.
    pub fn with_allow_private_address(mut self, allow: bool) -> Self {
        self.allow_private_address = allow;
        self
    }

    pub fn robots_timeout(&self) -> Duration {
        Duration::from_millis(self.robots_timeout_ms)
    }

    pub fn instance_timeout(&self) -> Duration {
        Duration::from_millis(self.instance_timeout_ms)
    }

    pub fn object_timeout(&self) -> Duration {
        Duration::from_millis(self.object_timeout_ms)
    }
}
