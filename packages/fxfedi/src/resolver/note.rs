//! Extraction rules for `Note` objects.
//!
//! Attribution and media are sub-items: each one is extracted through its own
//! `Result` and a failure drops only that item.

use thiserror::Error;
use url::Url;

use crate::error::FederationError;
use crate::policy::opt_out::OptOutPolicy;
use crate::text::html_to_text;
use crate::types::metadata::{AttributionMetadata, MediaMetadata};
use crate::types::object::{Actor, Attachment, Note};

/// Fallback when an image object declares no media type and the URL gives no
/// hint.
pub const UNKNOWN_IMAGE_TYPE: &str = "image/*";

/// Why a single attribution or attachment was dropped.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("not an image")]
    NotImage,

    #[error("no resolvable URL")]
    MissingUrl,

    #[error("expected {expected}, found {found}")]
    WrongType {
        expected: &'static str,
        found: String,
    },

    #[error("linked object not found")]
    NotFound,

    #[error("lookup timed out")]
    Timeout,

    #[error("lookup failed: {0}")]
    Lookup(#[from] FederationError),
}

/// Plain-text body with the summary or content warning in front.
///
/// `None` when the note has no body.
pub fn note_text(note: &Note) -> Option<String> {
    let content = note.content.as_deref()?;

    let mut text = String::new();
    let summary = note
        .summary
        .as_deref()
        .map(html_to_text)
        .filter(|s| !s.is_empty());
    match summary {
        Some(summary) if note.sensitive => {
            text.push_str("CW: ");
            text.push_str(&summary);
            text.push_str("\n\n");
        }
        Some(summary) => {
            text.push_str(&summary);
            text.push_str("\n\n");
        }
        None => {}
    }
    text.push_str(&html_to_text(content));

    let text = text.trim_end().to_string();
    (!text.is_empty()).then_some(text)
}

/// Build attribution from an actor, applying the opt-out policy.
pub fn attribution_from_actor(actor: &Actor, opt_out: &OptOutPolicy) -> AttributionMetadata {
    AttributionMetadata {
        url: actor.url.clone(),
        preferred_name: actor
            .preferred_username
            .clone()
            .filter(|n| !n.is_empty()),
        name: actor.name.clone().filter(|n| !n.is_empty()),
        opt_out: opt_out.actor_opted_out(actor),
    }
}

/// Media entry for one attachment, if it is an image with a URL.
pub fn media_from_attachment(attachment: &Attachment) -> Result<MediaMetadata, ItemError> {
    if !attachment.is_image() {
        return Err(ItemError::NotImage);
    }
    let url = attachment.url.clone().ok_or(ItemError::MissingUrl)?;
    let media_type = attachment
        .media_type
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| guess_image_type(&url));

    Ok(MediaMetadata {
        url,
        media_type,
        alt: attachment.name.clone().filter(|a| !a.is_empty()),
        width: attachment.width,
        height: attachment.height,
    })
}

fn guess_image_type(url: &Url) -> String {
    mime_guess::from_path(url.path())
        .first_raw()
        .filter(|mime| mime.starts_with("image/"))
        .unwrap_or(UNKNOWN_IMAGE_TYPE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::object::AttachmentKind;

    fn note(summary: Option<&str>, sensitive: bool, content: Option<&str>) -> Note {
        Note {
            summary: summary.map(String::from),
            sensitive,
            content: content.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_text_with_content_warning() {
        let text = note_text(&note(Some("spoilers"), true, Some("<p>The end</p>")));
        assert_eq!(text.as_deref(), Some("CW: spoilers\n\nThe end"));
    }

    #[test]
    fn test_text_with_plain_summary() {
        let text = note_text(&note(Some("Title"), false, Some("<p>Body</p>")));
        assert_eq!(text.as_deref(), Some("Title\n\nBody"));
    }

    #[test]
    fn test_text_without_summary() {
        let text = note_text(&note(None, true, Some("<p>Just <a href=\"https://x.example\">this</a></p>")));
        assert_eq!(text.as_deref(), Some("Just this"));
    }

    #[test]
    fn test_no_body_means_no_text() {
        assert_eq!(note_text(&note(Some("cw"), true, None)), None);
        assert_eq!(note_text(&note(None, false, Some(""))), None);
    }

    #[test]
    fn test_media_from_image_document() {
        let mut attachment = Attachment::new(AttachmentKind::Document);
        attachment.url = Some(Url::parse("https://files.example/a.png").unwrap());
        attachment.media_type = Some("image/png".to_string());
        attachment.name = Some("".to_string());
        attachment.width = Some(10);

        let media = media_from_attachment(&attachment).unwrap();
        assert_eq!(media.media_type, "image/png");
        assert_eq!(media.alt, None);
        assert_eq!(media.width, Some(10));
        assert_eq!(media.height, None);
    }

    #[test]
    fn test_image_object_without_media_type() {
        let mut attachment = Attachment::new(AttachmentKind::Image);
        attachment.url = Some(Url::parse("https://files.example/a.webp").unwrap());
        assert_eq!(media_from_attachment(&attachment).unwrap().media_type, "image/webp");

        attachment.url = Some(Url::parse("https://files.example/blob").unwrap());
        assert_eq!(
            media_from_attachment(&attachment).unwrap().media_type,
            UNKNOWN_IMAGE_TYPE
        );
    }

    #[test]
    fn test_non_images_and_missing_urls_rejected() {
        let mut video = Attachment::new(AttachmentKind::Document);
        video.media_type = Some("video/mp4".to_string());
        video.url = Some(Url::parse("https://files.example/a.mp4").unwrap());
        assert!(matches!(media_from_attachment(&video), Err(ItemError::NotImage)));

        let no_url = Attachment::new(AttachmentKind::Image);
        assert!(matches!(media_from_attachment(&no_url), Err(ItemError::MissingUrl)));
    }

    #[test]
    fn test_attribution_from_actor() {
        let actor = Actor {
            url: Some(Url::parse("https://example.social/@alice").unwrap()),
            preferred_username: Some("alice".to_string()),
            name: Some("".to_string()),
            summary: Some("<p>#nobot</p>".to_string()),
            ..Default::default()
        };

        let attribution = attribution_from_actor(&actor, &OptOutPolicy::default());
        assert_eq!(attribution.preferred_name.as_deref(), Some("alice"));
        assert_eq!(attribution.name, None);
        assert!(attribution.opt_out);
    }
}
