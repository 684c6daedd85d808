//! Resolve a normalized URL into a [`Metadata`] record.
//!
//! The object lookup is request-fatal. Everything hanging off the object
//! (attribution, media, instance info) is best effort and degrades to absent.

pub mod instance;
pub mod note;

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{FederationError, ResolveError, Result};
use crate::policy::opt_out::OptOutPolicy;
use crate::traits::federation::FederationClient;
use crate::traits::fetcher::Fetcher;
use crate::types::config::PipelineConfig;
use crate::types::metadata::{AttributionMetadata, MediaMetadata, Metadata};
use crate::types::object::{Actor, Attachment, Note, ObjectRef, RemoteObject};

pub use instance::fetch_instance_metadata;
pub use note::{attribution_from_actor, media_from_attachment, note_text, ItemError};

/// OpenGraph type emitted for notes.
pub const NOTE_KIND: &str = "article";

/// Looks up remote objects and extracts metadata from them.
pub struct ObjectResolver {
    federation: Arc<dyn FederationClient>,
    fetcher: Arc<dyn Fetcher>,
    opt_out: OptOutPolicy,
    object_timeout: Duration,
    instance_timeout: Duration,
}

impl ObjectResolver {
    pub fn new(
        federation: Arc<dyn FederationClient>,
        fetcher: Arc<dyn Fetcher>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            federation,
            fetcher,
            opt_out: OptOutPolicy::new(config.opt_out_phrases.iter().cloned()),
            object_timeout: config.object_timeout(),
            instance_timeout: config.instance_timeout(),
        }
    }

    /// Resolve the object at `url` and extract its metadata.
    pub async fn resolve(&self, url: &Url) -> Result<Metadata> {
        let object = self.lookup(url).await?;
        self.extract(object).await
    }

    async fn lookup(&self, url: &Url) -> Result<RemoteObject> {
        let not_found = |source| ResolveError::NotFound {
            url: url.to_string(),
            source,
        };

        match tokio::time::timeout(self.object_timeout, self.federation.resolve_object(url)).await
        {
            Ok(Ok(Some(object))) => Ok(object),
            Ok(Ok(None)) => {
                debug!(url = %url, "No remote object");
                Err(not_found(None))
            }
            Ok(Err(e)) => {
                warn!(url = %url, error = %e, "Object lookup failed");
                Err(not_found(Some(e)))
            }
            Err(_) => {
                warn!(url = %url, "Object lookup timed out");
                Err(not_found(Some(FederationError::Timeout {
                    url: url.to_string(),
                })))
            }
        }
    }

    async fn extract(&self, object: RemoteObject) -> Result<Metadata> {
        match object {
            RemoteObject::Note(note) => self.extract_note(note).await,
            other @ (RemoteObject::Actor(_)
            | RemoteObject::Attachment(_)
            | RemoteObject::Unsupported { .. }) => Err(ResolveError::UnsupportedType {
                kind: other.kind().to_string(),
            }),
        }
    }

    async fn extract_note(&self, note: Note) -> Result<Metadata> {
        let url = note.url.clone().ok_or(ResolveError::MissingUrl)?;

        let (instance, attribution, media) = tokio::join!(
            fetch_instance_metadata(self.fetcher.as_ref(), &url, self.instance_timeout),
            self.attribution(note.attributed_to.as_ref()),
            self.media(&note.attachments),
        );

        let mut metadata = Metadata::new(NOTE_KIND).with_url(url.clone());
        metadata.attribution = attribution;
        metadata.instance = instance;
        metadata.text_content = note_text(&note);
        metadata.media = media;
        metadata.timestamp = note.published;

        info!(
            url = %url,
            media = metadata.media.len(),
            has_attribution = metadata.attribution.is_some(),
            has_instance = metadata.instance.is_some(),
            "Resolved note"
        );
        Ok(metadata)
    }

    async fn attribution(
        &self,
        reference: Option<&ObjectRef<Actor>>,
    ) -> Option<AttributionMetadata> {
        let reference = reference?;
        match self.actor(reference).await {
            Ok(actor) => Some(attribution_from_actor(&actor, &self.opt_out)),
            Err(e) => {
                warn!(error = %e, "Dropping attribution");
                None
            }
        }
    }

    async fn actor(&self, reference: &ObjectRef<Actor>) -> std::result::Result<Actor, ItemError> {
        match reference {
            ObjectRef::Object(actor) => Ok(actor.clone()),
            ObjectRef::Link(url) => match self.dereference(url).await? {
                RemoteObject::Actor(actor) => Ok(actor),
                other => Err(ItemError::WrongType {
                    expected: "actor",
                    found: other.kind().to_string(),
                }),
            },
        }
    }

    /// Image attachments in source order; failing entries are skipped.
    async fn media(&self, attachments: &[ObjectRef<Attachment>]) -> Vec<MediaMetadata> {
        let results = join_all(attachments.iter().map(|reference| self.media_item(reference))).await;

        let mut media = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(item) => media.push(item),
                Err(ItemError::NotImage) => {}
                Err(e) => {
                    warn!(error = %e, "Dropping attachment");
                }
            }
        }
        media
    }

    async fn media_item(
        &self,
        reference: &ObjectRef<Attachment>,
    ) -> std::result::Result<MediaMetadata, ItemError> {
        match reference {
            ObjectRef::Object(attachment) => media_from_attachment(attachment),
            ObjectRef::Link(url) => match self.dereference(url).await? {
                RemoteObject::Attachment(attachment) => media_from_attachment(&attachment),
                other => Err(ItemError::WrongType {
                    expected: "attachment",
                    found: other.kind().to_string(),
                }),
            },
        }
    }

    async fn dereference(&self, url: &Url) -> std::result::Result<RemoteObject, ItemError> {
        match tokio::time::timeout(self.object_timeout, self.federation.resolve_object(url)).await {
            Ok(Ok(Some(object))) => Ok(object),
            Ok(Ok(None)) => Err(ItemError::NotFound),
            Ok(Err(e)) => Err(ItemError::Lookup(e)),
            Err(_) => Err(ItemError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockFederationClient, MockFetcher};
    use crate::types::object::AttachmentKind;

    const POST: &str = "https://example.social/@alice/1";

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn image(href: &str) -> Attachment {
        let mut attachment = Attachment::new(AttachmentKind::Image);
        attachment.url = Some(url(href));
        attachment.media_type = Some("image/png".to_string());
        attachment
    }

    fn resolver(federation: MockFederationClient) -> ObjectResolver {
        ObjectResolver::new(
            Arc::new(federation),
            Arc::new(MockFetcher::new()),
            &PipelineConfig::default().with_timeout(Duration::from_millis(200)),
        )
    }

    #[tokio::test]
    async fn test_non_note_types_unsupported() {
        let federation = MockFederationClient::new()
            .with_object(POST, RemoteObject::Actor(Actor::default()))
            .with_object(
                "https://example.social/polls/1",
                RemoteObject::Unsupported {
                    kind: "Question".to_string(),
                },
            );
        let resolver = resolver(federation);

        let err = resolver.resolve(&url(POST)).await.unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedType { ref kind } if kind == "Person"));

        let err = resolver
            .resolve(&url("https://example.social/polls/1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedType { ref kind } if kind == "Question"));
    }

    #[tokio::test]
    async fn test_missing_object_and_failures_are_not_found() {
        let resolver = resolver(MockFederationClient::new().with_failure("https://broken.example/1"));

        assert!(matches!(
            resolver.resolve(&url("https://other.example/1")).await,
            Err(ResolveError::NotFound { source: None, .. })
        ));
        assert!(matches!(
            resolver.resolve(&url("https://broken.example/1")).await,
            Err(ResolveError::NotFound { source: Some(_), .. })
        ));
    }

    #[tokio::test]
    async fn test_slow_lookup_is_not_found() {
        let federation = MockFederationClient::new()
            .with_object(POST, RemoteObject::Note(Note::default()))
            .with_delay(Duration::from_secs(5));

        assert!(matches!(
            resolver(federation).resolve(&url(POST)).await,
            Err(ResolveError::NotFound {
                source: Some(FederationError::Timeout { .. }),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_note_without_url() {
        let federation =
            MockFederationClient::new().with_object(POST, RemoteObject::Note(Note::default()));

        let err = resolver(federation).resolve(&url(POST)).await.unwrap_err();
        assert!(matches!(err, ResolveError::MissingUrl));
    }

    #[tokio::test]
    async fn test_linked_items_are_dereferenced_in_order() {
        let note = Note {
            url: Some(url(POST)),
            attributed_to: Some(ObjectRef::Link(url("https://example.social/users/alice"))),
            attachments: vec![
                ObjectRef::Object(image("https://files.example/1.png")),
                ObjectRef::Link(url("https://files.example/2")),
                ObjectRef::Link(url("https://files.example/missing")),
                ObjectRef::Object(image("https://files.example/3.png")),
            ],
            ..Default::default()
        };
        let actor = Actor {
            preferred_username: Some("alice".to_string()),
            ..Default::default()
        };
        let federation = MockFederationClient::new()
            .with_object(POST, RemoteObject::Note(note))
            .with_object(
                "https://example.social/users/alice",
                RemoteObject::Actor(actor),
            )
            .with_object(
                "https://files.example/2",
                RemoteObject::Attachment(image("https://files.example/2.png")),
            );

        let metadata = resolver(federation).resolve(&url(POST)).await.unwrap();
        assert_eq!(metadata.kind, NOTE_KIND);
        assert_eq!(
            metadata.attribution.unwrap().preferred_name.as_deref(),
            Some("alice")
        );
        let urls: Vec<&str> = metadata.media.iter().map(|m| m.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://files.example/1.png",
                "https://files.example/2.png",
                "https://files.example/3.png",
            ]
        );
    }

    #[tokio::test]
    async fn test_attribution_of_wrong_type_dropped() {
        let note = Note {
            url: Some(url(POST)),
            attributed_to: Some(ObjectRef::Link(url("https://example.social/notes/2"))),
            ..Default::default()
        };
        let federation = MockFederationClient::new()
            .with_object(POST, RemoteObject::Note(note.clone()))
            .with_object("https://example.social/notes/2", RemoteObject::Note(note));

        let metadata = resolver(federation).resolve(&url(POST)).await.unwrap();
        assert_eq!(metadata.attribution, None);
    }
}
