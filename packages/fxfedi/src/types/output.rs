//! Output shapes handed to link-unfurling consumers.

use serde::{Deserialize, Serialize};

/// One `<meta>` tag: either `name=` or `property=`, always with content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,

    pub content: String,
}

impl Tag {
    /// A `property=` tag (OpenGraph / Twitter).
    pub fn property(property: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: None,
            property: Some(property.into()),
            content: content.into(),
        }
    }

    /// A `name=` tag.
    pub fn name(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            property: None,
            content: content.into(),
        }
    }

    /// The `name` or `property` key, whichever is set.
    pub fn key(&self) -> &str {
        self.property
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }
}

/// oEmbed `link` document.
///
/// Field order matches the serialized JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OEmbed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub author_url: String,
    pub provider_name: String,
    pub provider_url: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_serialization_omits_missing_key() {
        let json = serde_json::to_string(&Tag::property("og:title", "Alice")).unwrap();
        assert_eq!(json, r#"{"property":"og:title","content":"Alice"}"#);

        let json = serde_json::to_string(&Tag::name("author", "Alice")).unwrap();
        assert_eq!(json, r#"{"name":"author","content":"Alice"}"#);
    }

    #[test]
    fn test_oembed_field_order() {
        let oembed = OEmbed {
            author_name: None,
            author_url: "https://example.social/@alice".to_string(),
            provider_name: "example.social".to_string(),
            provider_url: "https://example.social/@alice/1".to_string(),
            title: "Embed".to_string(),
            kind: "link".to_string(),
            version: "1.0".to_string(),
        };

        assert_eq!(
            serde_json::to_string(&oembed).unwrap(),
            r#"{"author_url":"https://example.social/@alice","provider_name":"example.social","provider_url":"https://example.social/@alice/1","title":"Embed","type":"link","version":"1.0"}"#
        );
    }
}
