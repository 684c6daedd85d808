//! Best-effort instance-info lookup.

use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::traits::fetcher::Fetcher;
use crate::types::metadata::InstanceMetadata;

/// Path of the Mastodon-compatible instance API.
pub const INSTANCE_API_PATH: &str = "/api/v1/instance";

/// The subset of the instance API we read. `uri` is Mastodon v1, `domain` is
/// the v2 naming some servers also emit.
#[derive(Debug, Deserialize)]
struct InstanceInfo {
    uri: Option<String>,
    domain: Option<String>,
    title: Option<String>,
}

/// Look up instance info for the origin of `post_url`.
///
/// Any failure (transport, status, non-JSON body, timeout) yields `None`.
pub async fn fetch_instance_metadata(
    fetcher: &dyn Fetcher,
    post_url: &Url,
    timeout: Duration,
) -> Option<InstanceMetadata> {
    let mut api_url = post_url.clone();
    api_url.set_path(INSTANCE_API_PATH);
    api_url.set_query(None);
    api_url.set_fragment(None);

    let response = match tokio::time::timeout(timeout, fetcher.get(&api_url)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            warn!(url = %api_url, error = %e, "Instance info fetch failed");
            return None;
        }
        Err(_) => {
            warn!(url = %api_url, "Instance info fetch timed out");
            return None;
        }
    };

    if !response.is_success() {
        debug!(url = %api_url, status = response.status, "No instance info");
        return None;
    }

    let info: InstanceInfo = match serde_json::from_str(&response.body) {
        Ok(info) => info,
        Err(e) => {
            warn!(url = %api_url, error = %e, "Instance info is not JSON");
            return None;
        }
    };

    let domain = info
        .uri
        .or(info.domain)
        .map(|raw| bare_domain(&raw))
        .filter(|d| !d.is_empty())
        .or_else(|| post_url.host_str().map(String::from))?;

    Some(InstanceMetadata {
        domain,
        title: info.title.filter(|t| !t.is_empty()),
    })
}

/// Some servers report `uri` as a full URL rather than a domain.
fn bare_domain(raw: &str) -> String {
    Url::parse(raw)
        .ok()
        .and_then(|url| url.host_str().map(String::from))
        .unwrap_or_else(|| raw.trim().trim_end_matches('/').to_string())
}
