//! Decoding ActivityStreams JSON into [`RemoteObject`]s.
//!
//! This is not a JSON-LD processor. It reads the compacted shapes Mastodon,
//! Misskey and friends actually send, where most properties may be a string,
//! an object or an array of either.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FederationError, FederationResult};
use crate::types::object::{
    Actor, ActorKind, Attachment, AttachmentKind, Note, ObjectRef, RemoteObject,
};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LinkValue {
    Href(String),
    Link { href: String },
}

impl LinkValue {
    fn href(&self) -> &str {
        match self {
            LinkValue::Href(href) => href,
            LinkValue::Link { href } => href,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawObject {
    #[serde(rename = "type")]
    kind: Option<OneOrMany<String>>,
    url: Option<OneOrMany<LinkValue>>,
    href: Option<String>,
    sensitive: Option<bool>,
    summary: Option<String>,
    content: Option<String>,
    content_map: Option<BTreeMap<String, String>>,
    attributed_to: Option<OneOrMany<Value>>,
    published: Option<String>,
    attachment: Option<OneOrMany<Value>>,
    preferred_username: Option<String>,
    name: Option<String>,
    noindex: Option<bool>,
    media_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Decode one ActivityStreams document.
///
/// Unknown types decode to [`RemoteObject::Unsupported`]; a document without
/// any `type` is a decode error.
pub fn decode_object(value: Value) -> FederationResult<RemoteObject> {
    let raw: RawObject =
        serde_json::from_value(value).map_err(|e| FederationError::Decode(e.to_string()))?;
    raw.into_remote_object()
}

impl RawObject {
    fn types(&self) -> Vec<&str> {
        match &self.kind {
            Some(OneOrMany::One(kind)) => vec![kind.as_str()],
            Some(OneOrMany::Many(kinds)) => kinds.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }

    fn into_remote_object(self) -> FederationResult<RemoteObject> {
        let types = self.types();
        let Some(first) = types.first().map(|t| t.to_string()) else {
            return Err(FederationError::Decode("object has no type".to_string()));
        };
        let is_note = types.contains(&"Note");
        let actor_kind = types.iter().find_map(|t| ActorKind::from_type(t));
        let is_attachment = types.iter().any(|t| matches!(*t, "Document" | "Image"));
        drop(types);

        if is_note {
            return Ok(RemoteObject::Note(self.into_note()));
        }
        if let Some(kind) = actor_kind {
            return Ok(RemoteObject::Actor(self.into_actor(kind)));
        }
        if is_attachment {
            return Ok(RemoteObject::Attachment(self.into_attachment()));
        }

        Ok(RemoteObject::Unsupported { kind: first })
    }

    fn first_url(&self) -> Option<Url> {
        let links: &[LinkValue] = match &self.url {
            Some(OneOrMany::One(link)) => std::slice::from_ref(link),
            Some(OneOrMany::Many(links)) => links.as_slice(),
            None => &[],
        };
        links
            .iter()
            .find_map(|link| Url::parse(link.href()).ok())
            .or_else(|| self.href.as_deref().and_then(|h| Url::parse(h).ok()))
    }

    fn into_note(self) -> Note {
        let url = self.first_url();
        let published = self.published.as_deref().and_then(parse_timestamp);
        let content = self
            .content
            .or_else(|| self.content_map.and_then(|map| map.into_values().next()));

        let attributed_to = self
            .attributed_to
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .find_map(decode_actor_ref);

        let attachments = self
            .attachment
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .filter_map(decode_attachment_ref)
            .collect();

        Note {
            url,
            sensitive: self.sensitive.unwrap_or(false),
            summary: self.summary.filter(|s| !s.is_empty()),
            content,
            attributed_to,
            published,
            attachments,
        }
    }

    fn into_actor(self, kind: ActorKind) -> Actor {
        Actor {
            kind,
            url: self.first_url(),
            preferred_username: self.preferred_username,
            name: self.name,
            summary: self.summary,
            opt_out: self.noindex.unwrap_or(false),
        }
    }

    fn into_attachment(self) -> Attachment {
        let kind = self
            .types()
            .first()
            .map(|t| AttachmentKind::from_type(t))
            .unwrap_or(AttachmentKind::Document);
        let url = self.first_url();

        Attachment {
            kind,
            url,
            media_type: self.media_type,
            name: self.name,
            width: self.width,
            height: self.height,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(timestamp) => Some(timestamp.with_timezone(&Utc)),
        Err(e) => {
            debug!(published = raw, error = %e, "Ignoring unparseable publish time");
            None
        }
    }
}

fn decode_actor_ref(value: Value) -> Option<ObjectRef<Actor>> {
    match value {
        Value::String(href) => Url::parse(&href).ok().map(ObjectRef::Link),
        Value::Object(_) => match decode_object(value) {
            Ok(RemoteObject::Actor(actor)) => Some(ObjectRef::Object(actor)),
            Ok(other) => {
                debug!(kind = other.kind(), "Skipping non-actor attribution");
                None
            }
            Err(e) => {
                warn!(error = %e, "Dropping undecodable attribution");
                None
            }
        },
        _ => None,
    }
}

fn decode_attachment_ref(value: Value) -> Option<ObjectRef<Attachment>> {
    match value {
        Value::String(href) => Url::parse(&href).ok().map(ObjectRef::Link),
        Value::Object(_) => {
            let raw: RawObject = match serde_json::from_value(value) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(error = %e, "Dropping undecodable attachment");
                    return None;
                }
            };
            Some(ObjectRef::Object(raw.into_attachment()))
        }
        _ => None,
    }
}
