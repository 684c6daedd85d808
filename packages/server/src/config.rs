use anyhow::{Context, Result};
use dotenvy::dotenv;
use fxfedi::PipelineConfig;
use std::env;
use std::time::Duration;
use url::Url;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Crawler token announced in robots checks and the user agent
    pub federation_identifier: String,
    /// Public URL of this service
    pub federation_url: Url,
    pub allow_private_address: bool,
    pub fetch_timeout: Duration,
    /// Replaces the built-in opt-out phrases when set
    pub opt_out_phrases: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let federation_url = lookup("FEDERATION_URL").context("FEDERATION_URL must be set")?;

        Ok(Self {
            host: lookup("HTTP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("HTTP_PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse()
                .context("HTTP_PORT must be a valid number")?,
            federation_identifier: lookup("FEDERATION_IDENTIFIER")
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| fxfedi::types::config::DEFAULT_CRAWLER_TOKEN.to_string()),
            federation_url: Url::parse(&federation_url)
                .context("FEDERATION_URL must be an absolute URL")?,
            allow_private_address: lookup("FEDERATION_ALLOW_PRIVATE_ADDRESS")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(false),
            fetch_timeout: Duration::from_secs(
                lookup("FETCH_TIMEOUT_SECS")
                    .unwrap_or_else(|| "10".to_string())
                    .parse()
                    .context("FETCH_TIMEOUT_SECS must be a valid number")?,
            ),
            opt_out_phrases: lookup("OPT_OUT_PHRASES").map(|phrases| {
                phrases
                    .split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect()
            }),
        })
    }

    /// Outbound User-Agent: `{identifier}/{version} (+{public url})`
    pub fn user_agent(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.federation_identifier,
            env!("CARGO_PKG_VERSION"),
            self.federation_url
        )
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        let config = PipelineConfig::default()
            .with_crawler_token(self.federation_identifier.clone())
            .with_user_agent(self.user_agent())
            .with_timeout(self.fetch_timeout)
            .with_allow_private_address(self.allow_private_address);

        match &self.opt_out_phrases {
            Some(phrases) => config.with_opt_out_phrases(phrases.iter().cloned()),
            None => config,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
