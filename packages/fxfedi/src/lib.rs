//! Fediverse Post Metadata Library
//!
//! Turns a (possibly garbled) link to a federated social-web post into
//! OpenGraph/Twitter meta tags and an oEmbed `link` record, so chat apps and
//! link unfurlers can render a preview.
//!
//! # Pipeline
//!
//! 1. **Normalize** the raw URL, repairing `https:/host` style schemes
//! 2. **Gate** on the origin's robots.txt for the service and the requester
//! 3. **Resolve** the remote object through a [`FederationClient`]
//! 4. **Enforce** author opt-out
//! 5. **Project** into tags ([`to_tags`]) or oEmbed ([`to_oembed`])
//!
//! Robots and instance-info lookups fail open; only the steps that make a
//! preview impossible surface as [`ResolveError`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fxfedi::{ActivityPubClient, HttpFetcher, MetadataPipeline, PipelineConfig};
//!
//! let config = PipelineConfig::default();
//! let pipeline = MetadataPipeline::new(
//!     Arc::new(ActivityPubClient::from_config(&config)?),
//!     Arc::new(HttpFetcher::from_config(&config)?),
//!     config,
//! );
//!
//! let metadata = pipeline
//!     .resolve("https:/example.social/@alice/1", &["Discordbot/2.0"])
//!     .await?;
//! let tags = fxfedi::to_tags(&metadata);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator seams (FederationClient, Fetcher)
//! - [`types`] - Metadata, remote objects, output shapes, config
//! - [`normalize`] - URL repair and plausibility filter
//! - [`policy`] - robots.txt and author opt-out
//! - [`resolver`] - Remote object dispatch and field extraction
//! - [`projection`] - Tag and oEmbed projectors
//! - [`federation`] / [`fetchers`] - reqwest-backed collaborators
//! - [`security`] - SSRF protection
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod federation;
pub mod fetchers;
pub mod normalize;
pub mod pipeline;
pub mod policy;
pub mod projection;
pub mod resolver;
pub mod security;
pub mod testing;
pub mod text;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{FederationError, FetchError, ResolveError, Result, SecurityError};
pub use traits::{
    federation::FederationClient,
    fetcher::{FetchedResponse, Fetcher},
};
pub use types::{
    config::PipelineConfig,
    metadata::{AttributionMetadata, InstanceMetadata, MediaMetadata, Metadata},
    normalized::NormalizedUrl,
    object::{Actor, ActorKind, Attachment, AttachmentKind, Note, ObjectRef, RemoteObject},
    output::{OEmbed, Tag},
};

pub use normalize::{is_plausible_domain, normalize};
pub use pipeline::MetadataPipeline;
pub use policy::{is_opted_out, OptOutPolicy, RobotsPolicy, RobotsTxt};
pub use projection::{
    error_tags, opted_out_oembed, opted_out_tags, robots_disallowed_tags, to_oembed, to_tags,
};
pub use resolver::ObjectResolver;
pub use text::html_to_text;

// Re-export collaborators
pub use federation::ActivityPubClient;
pub use fetchers::HttpFetcher;
pub use security::UrlValidator;

// Re-export testing utilities
pub use testing::{MockFederationClient, MockFetcher};
