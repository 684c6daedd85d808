//! The normalized metadata record produced for a remote post.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Normalized metadata for one remote post.
///
/// `media` keeps the source attachment order and `text_content` is always
/// plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// OpenGraph object type (`"article"` for notes)
    #[serde(rename = "type")]
    pub kind: String,

    /// Canonical URL of the post
    pub url: Option<Url>,

    /// Author of the post
    pub attribution: Option<AttributionMetadata>,

    /// Server hosting the post
    pub instance: Option<InstanceMetadata>,

    /// Plain-text body, prefixed with the summary or content warning
    pub text_content: Option<String>,

    /// Image attachments in source order
    #[serde(default)]
    pub media: Vec<MediaMetadata>,

    /// Publish time
    pub timestamp: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Create an empty record of the given type.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            url: None,
            attribution: None,
            instance: None,
            text_content: None,
            media: Vec::new(),
            timestamp: None,
        }
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn with_attribution(mut self, attribution: AttributionMetadata) -> Self {
        self.attribution = Some(attribution);
        self
    }

    pub fn with_instance(mut self, instance: InstanceMetadata) -> Self {
        self.instance = Some(instance);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    pub fn with_media(mut self, media: MediaMetadata) -> Self {
        self.media.push(media);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// `@preferredName@instanceDomain`, when both parts are known.
    pub fn formatted_handle(&self) -> Option<String> {
        let preferred = self
            .attribution
            .as_ref()?
            .preferred_name
            .as_deref()
            .filter(|name| !name.is_empty())?;
        let domain = self
            .instance
            .as_ref()
            .map(|i| i.domain.as_str())
            .filter(|domain| !domain.is_empty())?;
        Some(format!("@{}@{}", preferred, domain))
    }
}

/// The author of a post, derived from its attributed actor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributionMetadata {
    /// Profile URL
    pub url: Option<Url>,

    /// Username without the instance part
    pub preferred_name: Option<String>,

    /// Display name
    pub name: Option<String>,

    /// Author asked not to be proxied
    #[serde(default)]
    pub opt_out: bool,
}

/// The server hosting a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceMetadata {
    pub domain: String,
    pub title: Option<String>,
}

impl InstanceMetadata {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// One image attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub url: Url,

    /// MIME type, e.g. `image/png`
    #[serde(rename = "type")]
    pub media_type: String,

    pub alt: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl MediaMetadata {
    pub fn new(url: Url, media_type: impl Into<String>) -> Self {
        Self {
            url,
            media_type: media_type.into(),
            alt: None,
            width: None,
            height: None,
        }
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}
