//! oEmbed `link` projection.

use url::Url;

use super::fallback::FallbackChain;
use crate::policy::opt_out::is_opted_out;
use crate::types::metadata::Metadata;
use crate::types::output::OEmbed;

pub const OEMBED_TITLE: &str = "Embed";
pub const OEMBED_TYPE: &str = "link";
pub const OEMBED_VERSION: &str = "1.0";

/// Project metadata into an oEmbed record.
///
/// `fallback` is the normalized URL that was requested; every required field
/// ends its chain there, so this never fails.
pub fn to_oembed(metadata: &Metadata, fallback: &Url) -> OEmbed {
    if is_opted_out(metadata.attribution.as_ref()) {
        return opted_out_oembed(fallback);
    }

    let attribution = metadata.attribution.as_ref();

    let author_name = FallbackChain::new("author_name")
        .or("handle", || metadata.formatted_handle())
        .or("preferred_name", || {
            attribution
                .and_then(|a| a.preferred_name.clone())
                .filter(|name| !name.is_empty())
        })
        .resolve();

    let author_url = FallbackChain::new("author_url")
        .or("attribution", || {
            attribution.and_then(|a| a.url.as_ref()).map(Url::to_string)
        })
        .or("object", || metadata.url.as_ref().map(Url::to_string))
        .or("requested", || Some(fallback.to_string()))
        .resolve()
        .unwrap_or_else(|| fallback.to_string());

    let provider_name = FallbackChain::new("provider_name")
        .or("instance_domain", || {
            metadata
                .instance
                .as_ref()
                .map(|i| i.domain.clone())
                .filter(|domain| !domain.is_empty())
        })
        .or("instance_title", || {
            metadata.instance.as_ref().and_then(|i| i.title.clone())
        })
        .or("object_host", || {
            metadata
                .url
                .as_ref()
                .and_then(|url| url.host_str().map(String::from))
        })
        .or("requested_host", || fallback.host_str().map(String::from))
        .resolve()
        .unwrap_or_default();

    OEmbed {
        author_name,
        author_url,
        provider_name,
        ..link_document(fallback)
    }
}

/// Fixed record for authors who opted out. Depends only on `fallback`.
pub fn opted_out_oembed(fallback: &Url) -> OEmbed {
    OEmbed {
        author_name: None,
        author_url: fallback.to_string(),
        provider_name: fallback.host_str().unwrap_or_default().to_string(),
        ..link_document(fallback)
    }
}

fn link_document(fallback: &Url) -> OEmbed {
    OEmbed {
        author_name: None,
        author_url: String::new(),
        provider_name: String::new(),
        provider_url: fallback.to_string(),
        title: OEMBED_TITLE.to_string(),
        kind: OEMBED_TYPE.to_string(),
        version: OEMBED_VERSION.to_string(),
    }
}
