//! End-to-end pipeline tests over the mock collaborators.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use fxfedi::{
    to_oembed, to_tags, Actor, Attachment, AttachmentKind, MetadataPipeline, MockFederationClient,
    MockFetcher, Note, ObjectRef, PipelineConfig, RemoteObject, ResolveError,
};
use serde_json::json;
use url::Url;

const POST: &str = "https://example.social/@alice/110000000000000001";
const ACTOR: &str = "https://example.social/users/alice";

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn image(href: &str, media_type: &str) -> Attachment {
    let mut attachment = Attachment::new(AttachmentKind::Document);
    attachment.url = Some(url(href));
    attachment.media_type = Some(media_type.to_string());
    attachment
}

fn alice() -> Actor {
    Actor {
        url: Some(url("https://example.social/@alice")),
        preferred_username: Some("alice".to_string()),
        name: Some("Alice".to_string()),
        summary: Some("<p>Posting about cats</p>".to_string()),
        ..Default::default()
    }
}

fn note() -> Note {
    Note {
        url: Some(url(POST)),
        sensitive: true,
        summary: Some("cat pics".to_string()),
        content: Some("<p>Look at <a href=\"https://example.social/tags/cats\">#cats</a></p>".to_string()),
        attributed_to: Some(ObjectRef::Link(url(ACTOR))),
        published: Some(Utc.with_ymd_and_hms(2024, 7, 23, 18, 4, 5).unwrap()),
        attachments: vec![
            ObjectRef::Object(image("https://files.example.social/1.png", "image/png")),
            ObjectRef::Object(image("https://files.example.social/clip.mp4", "video/mp4")),
            ObjectRef::Link(url("https://files.example.social/gone")),
            ObjectRef::Object(image("https://files.example.social/2.jpg", "image/jpeg")),
        ],
        ..Default::default()
    }
}

fn federation() -> MockFederationClient {
    MockFederationClient::new()
        .with_object(POST, RemoteObject::Note(note()))
        .with_object(ACTOR, RemoteObject::Actor(alice()))
}

fn fetcher() -> MockFetcher {
    MockFetcher::new().with_json(
        "https://example.social/api/v1/instance",
        json!({"uri": "example.social", "title": "Example Social"}),
    )
}

fn pipeline(federation: MockFederationClient, fetcher: MockFetcher) -> MetadataPipeline {
    MetadataPipeline::new(
        Arc::new(federation),
        Arc::new(fetcher),
        PipelineConfig::default().with_timeout(Duration::from_millis(500)),
    )
}

#[tokio::test]
async fn test_full_resolution_and_projection() {
    let pipeline = pipeline(federation(), fetcher());

    // Garbled scheme from a link-sharing proxy
    let metadata = pipeline
        .resolve("https:/example.social/@alice/110000000000000001", &["Discordbot/2.0"])
        .await
        .unwrap();

    assert_eq!(metadata.kind, "article");
    assert_eq!(
        metadata.text_content.as_deref(),
        Some("CW: cat pics\n\nLook at #cats")
    );
    assert_eq!(metadata.formatted_handle().as_deref(), Some("@alice@example.social"));
    assert_eq!(metadata.media.len(), 2);
    assert_eq!(metadata.media[0].url.as_str(), "https://files.example.social/1.png");
    assert_eq!(metadata.media[1].url.as_str(), "https://files.example.social/2.jpg");

    let tags = to_tags(&metadata);
    let keys: Vec<&str> = tags.iter().map(|t| t.key()).collect();
    assert_eq!(
        keys,
        vec![
            "og:published_time",
            "og:title",
            "author",
            "twitter:card",
            "og:image",
            "og:image:type",
            "og:image",
            "og:image:type",
            "description",
            "og:description",
        ]
    );
    assert_eq!(tags[1].content, "Alice");

    let oembed = to_oembed(&metadata, &url(POST));
    assert_eq!(oembed.author_name.as_deref(), Some("@alice@example.social"));
    assert_eq!(oembed.author_url, "https://example.social/@alice");
    assert_eq!(oembed.provider_name, "example.social");
    assert_eq!(oembed.provider_url, POST);
}

#[tokio::test]
async fn test_robots_disallow_by_either_identity() {
    let robots = "User-agent: discordbot\nDisallow: /@\n\nUser-agent: *\nAllow: /\n";

    let fetcher = fetcher().with_body("https://example.social/robots.txt", robots);
    let federation = federation();
    let blocked = pipeline(federation.clone(), fetcher.clone())
        .resolve(POST, &["Discordbot/2.0"])
        .await;
    assert!(matches!(blocked, Err(ResolveError::RobotsDisallowed { .. })));
    assert!(federation.requested().is_empty());

    let allowed = pipeline(federation.clone(), fetcher)
        .resolve(POST, &["Slackbot-LinkExpanding 1.0"])
        .await;
    assert!(allowed.is_ok());

    let service_blocked = fetcher_with_robots("User-agent: fxfedi\nDisallow: /\n");
    assert!(matches!(
        pipeline(federation, service_blocked).resolve(POST, &[]).await,
        Err(ResolveError::RobotsDisallowed { .. })
    ));
}

fn fetcher_with_robots(robots: &str) -> MockFetcher {
    fetcher().with_body("https://example.social/robots.txt", robots)
}

#[tokio::test]
async fn test_robots_failure_is_fail_open() {
    let broken = fetcher().with_failure("https://example.social/robots.txt");
    assert!(pipeline(federation(), broken).resolve(POST, &[]).await.is_ok());
}

#[tokio::test]
async fn test_request_fatal_failures() {
    let pipeline = pipeline(
        federation()
            .with_object(
                "https://example.social/users/bob",
                RemoteObject::Actor(Actor::default()),
            )
            .with_object(
                "https://example.social/notes/no-url",
                RemoteObject::Note(Note::default()),
            ),
        fetcher(),
    );

    assert!(matches!(
        pipeline.resolve("https://example.social/@nobody/1", &[]).await,
        Err(ResolveError::NotFound { .. })
    ));
    assert!(matches!(
        pipeline.resolve("https://example.social/users/bob", &[]).await,
        Err(ResolveError::UnsupportedType { ref kind }) if kind == "Person"
    ));
    assert!(matches!(
        pipeline.resolve("https://example.social/notes/no-url", &[]).await,
        Err(ResolveError::MissingUrl)
    ));
    assert!(matches!(
        pipeline.resolve("example.png", &[]).await,
        Err(ResolveError::DisallowedDomain { .. })
    ));
}

#[tokio::test]
async fn test_instance_failure_degrades() {
    let metadata = pipeline(federation(), MockFetcher::new())
        .resolve(POST, &[])
        .await
        .unwrap();

    assert_eq!(metadata.instance, None);
    assert_eq!(metadata.formatted_handle(), None);
    assert_eq!(metadata.attribution.unwrap().name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn test_opted_out_author_yields_fixed_documents() {
    let mut opted_out = alice();
    opted_out.summary = Some("<p>Please no <strong>#NoBot</strong></p>".to_string());
    let federation = federation().with_object(ACTOR, RemoteObject::Actor(opted_out));

    let metadata = pipeline(federation, fetcher()).resolve(POST, &[]).await.unwrap();

    let tags = to_tags(&metadata);
    assert_eq!(tags, fxfedi::opted_out_tags());
    let rendered = serde_json::to_string(&tags).unwrap();
    assert!(!rendered.contains("Alice"));
    assert!(!rendered.contains("cat"));

    assert_eq!(
        to_oembed(&metadata, &url(POST)),
        fxfedi::opted_out_oembed(&url(POST))
    );
}

#[tokio::test]
async fn test_custom_opt_out_phrases() {
    let mut actor = alice();
    actor.summary = Some("<p>no previews please</p>".to_string());
    let federation = federation().with_object(ACTOR, RemoteObject::Actor(actor));

    let config = PipelineConfig::default().with_opt_out_phrases(["No Previews"]);
    let pipeline = MetadataPipeline::new(Arc::new(federation), Arc::new(fetcher()), config);

    let metadata = pipeline.resolve(POST, &[]).await.unwrap();
    assert!(fxfedi::is_opted_out(metadata.attribution.as_ref()));
}
