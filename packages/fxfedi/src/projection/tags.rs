//! OpenGraph / Twitter tag projection.

use chrono::SecondsFormat;

use super::fallback::FallbackChain;
use crate::policy::opt_out::is_opted_out;
use crate::types::metadata::{MediaMetadata, Metadata};
use crate::types::output::Tag;

pub const OPT_OUT_TITLE: &str = "Metadata unavailable";
pub const OPT_OUT_DESCRIPTION: &str =
    "The author of this post has opted out of link previews. Please view the original page instead.";

pub const ROBOTS_DISALLOWED_TITLE: &str = "Unable to fetch metadata";
pub const ROBOTS_DISALLOWED_DESCRIPTION: &str = "The remote server that hosts this post has requested the user agent not scrape their services. Please view the original page instead.";

/// Project metadata into an ordered tag list.
///
/// Order: publish time, title/author, card type, one block per image, then
/// the description pair. An opted-out author gets [`opted_out_tags`] instead.
pub fn to_tags(metadata: &Metadata) -> Vec<Tag> {
    if is_opted_out(metadata.attribution.as_ref()) {
        return opted_out_tags();
    }

    let mut tags = Vec::new();

    if let Some(timestamp) = metadata.timestamp {
        tags.push(Tag::property(
            "og:published_time",
            timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        ));
    }

    if let Some(display_name) = display_name(metadata) {
        tags.push(Tag::property("og:title", display_name.clone()));
        tags.push(Tag::name("author", display_name));
    }

    if !metadata.media.is_empty() {
        tags.push(Tag::property("twitter:card", "summary_large_image"));
    }
    for media in &metadata.media {
        tags.extend(media_tags(media));
    }

    if let Some(text) = &metadata.text_content {
        tags.push(Tag::name("description", text.clone()));
        tags.push(Tag::property("og:description", text.clone()));
    }

    tags
}

/// Name shown for the author: real name, then handle, then profile URL.
pub fn display_name(metadata: &Metadata) -> Option<String> {
    let attribution = metadata.attribution.as_ref();

    let name = FallbackChain::new("display_name")
        .or("name", || {
            attribution
                .and_then(|a| a.name.clone())
                .filter(|name| !name.is_empty())
        })
        .or("handle", || metadata.formatted_handle())
        .or("url", || {
            attribution
                .and_then(|a| a.url.as_ref())
                .map(|url| url.to_string())
        })
        .resolve();
    name
}

fn media_tags(media: &MediaMetadata) -> Vec<Tag> {
    [
        ("og:image", Some(media.url.to_string())),
        ("og:image:type", Some(media.media_type.clone())),
        ("og:image:width", media.width.map(|w| w.to_string())),
        ("og:image:height", media.height.map(|h| h.to_string())),
        ("og:image:alt", media.alt.clone()),
    ]
    .into_iter()
    .filter_map(|(property, content)| content.map(|content| Tag::property(property, content)))
    .collect()
}

/// A fixed two-tag document for requests that produced no metadata.
pub fn error_tags(title: &str, description: &str) -> Vec<Tag> {
    vec![
        Tag::property("og:title", title),
        Tag::property("og:description", description),
    ]
}

/// Placeholder for origins whose robots.txt blocks the requester.
pub fn robots_disallowed_tags() -> Vec<Tag> {
    error_tags(ROBOTS_DISALLOWED_TITLE, ROBOTS_DISALLOWED_DESCRIPTION)
}

/// Placeholder for authors who opted out.
pub fn opted_out_tags() -> Vec<Tag> {
    error_tags(OPT_OUT_TITLE, OPT_OUT_DESCRIPTION)
}
