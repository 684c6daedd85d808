//! The metadata resolution pipeline.
//!
//! ```text
//! raw URL ─► normalize ─► plausibility ─► robots gate ─► resolve ─► opt-out
//! ```
//!
//! Each stage runs only after the previous one succeeded. Robots and
//! instance-info failures are absorbed; everything else surfaces as a
//! [`ResolveError`].

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ResolveError, Result};
use crate::normalize::{is_plausible_domain, normalize};
use crate::policy::opt_out::is_opted_out;
use crate::policy::robots::{fetch_policy, is_disallowed_for_any};
use crate::resolver::ObjectResolver;
use crate::traits::federation::FederationClient;
use crate::traits::fetcher::Fetcher;
use crate::types::config::PipelineConfig;
use crate::types::metadata::{AttributionMetadata, Metadata};
use crate::types::normalized::NormalizedUrl;

/// Resolves raw post URLs into [`Metadata`].
///
/// Holds no per-request state; share one instance across requests.
pub struct MetadataPipeline {
    fetcher: Arc<dyn Fetcher>,
    resolver: ObjectResolver,
    config: PipelineConfig,
}

impl MetadataPipeline {
    pub fn new(
        federation: Arc<dyn FederationClient>,
        fetcher: Arc<dyn Fetcher>,
        config: PipelineConfig,
    ) -> Self {
        let resolver = ObjectResolver::new(federation, fetcher.clone(), &config);
        Self {
            fetcher,
            resolver,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Normalize `raw` and resolve it on behalf of the given crawlers.
    ///
    /// `user_agents` are the requesting client's identities; the service's own
    /// crawler token is always checked as well.
    pub async fn resolve(&self, raw: &str, user_agents: &[&str]) -> Result<Metadata> {
        let url = normalize(raw)?;
        self.resolve_normalized(&url, user_agents).await
    }

    /// Resolve an already normalized URL.
    pub async fn resolve_normalized(
        &self,
        url: &NormalizedUrl,
        user_agents: &[&str],
    ) -> Result<Metadata> {
        if !is_plausible_domain(url) {
            debug!(url = %url, "Rejecting implausible domain");
            return Err(ResolveError::DisallowedDomain {
                host: url.host().to_string(),
            });
        }

        let tokens = self.crawler_tokens(user_agents);
        let policy = fetch_policy(self.fetcher.as_ref(), url, self.config.robots_timeout()).await;
        if is_disallowed_for_any(policy.as_ref(), url, &tokens) {
            info!(url = %url, agents = ?tokens, "robots.txt disallows fetch");
            return Err(ResolveError::RobotsDisallowed {
                url: url.to_string(),
            });
        }

        let metadata = self.resolver.resolve(url).await?;

        if is_opted_out(metadata.attribution.as_ref()) {
            info!(url = %url, "Author opted out, redacting metadata");
            return Ok(redact(metadata));
        }
        Ok(metadata)
    }

    fn crawler_tokens<'a>(&'a self, user_agents: &[&'a str]) -> Vec<&'a str> {
        let mut tokens = vec![self.config.crawler_token.as_str()];
        tokens.extend(
            user_agents
                .iter()
                .copied()
                .map(str::trim)
                .filter(|agent| !agent.is_empty()),
        );
        tokens
    }
}

/// Keep only what the projectors need to recognise an opted-out record.
fn redact(metadata: Metadata) -> Metadata {
    Metadata {
        kind: metadata.kind,
        url: metadata.url,
        attribution: Some(AttributionMetadata {
            opt_out: true,
            ..Default::default()
        }),
        instance: None,
        text_content: None,
        media: Vec::new(),
        timestamp: None,
    }
}
