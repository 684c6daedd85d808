//! Typed errors for the metadata pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so the routing layer can
//! decide how each failure is rendered.

use thiserror::Error;

/// Request-fatal failures surfaced by [`crate::MetadataPipeline::resolve`].
///
/// Robots and instance-info failures never appear here; they are absorbed
/// inside the pipeline.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Input could not be repaired into an absolute http(s) URL
    #[error("malformed URL: {input}")]
    MalformedUrl { input: String },

    /// Host failed the plausibility filter
    #[error("disallowed domain: {host}")]
    DisallowedDomain { host: String },

    /// The origin's robots.txt blocks one of the requesting crawlers
    #[error("robots.txt disallows: {url}")]
    RobotsDisallowed { url: String },

    /// No remote object could be located at the URL
    #[error("remote object not found: {url}")]
    NotFound {
        url: String,
        #[source]
        source: Option<FederationError>,
    },

    /// The object exists but there is no extraction rule for its type
    #[error("object type {kind} not supported")]
    UnsupportedType { kind: String },

    /// The object carries no canonical URL
    #[error("remote object has no URL")]
    MissingUrl,
}

/// Errors from the federation object client.
#[derive(Debug, Error)]
pub enum FederationError {
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Remote answered with a non-success status other than not-found
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// Response body was not a usable ActivityStreams document
    #[error("decode error: {0}")]
    Decode(String),

    /// Lookup exceeded its time budget
    #[error("timeout resolving: {url}")]
    Timeout { url: String },

    /// Security validation failed
    #[error("security error: {0}")]
    Security(#[from] SecurityError),
}

/// Errors from the plain HTTP fetch primitive.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request exceeded its time budget
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Security validation failed
    #[error("security error: {0}")]
    Security(#[from] SecurityError),
}

/// Security-related errors, primarily for SSRF protection.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// URL scheme not allowed (e.g., file://, ftp://)
    #[error("disallowed URL scheme: {0}")]
    DisallowedScheme(String),

    /// Host is blocked (e.g., localhost, internal IPs)
    #[error("blocked host: {0}")]
    BlockedHost(String),

    /// IP in blocked CIDR range (e.g., 10.0.0.0/8)
    #[error("blocked IP range: {0}")]
    BlockedCidr(String),

    /// URL has no host
    #[error("URL has no host")]
    NoHost,

    /// Host name could not be resolved for the address check
    #[error("DNS resolution failed: {0}")]
    DnsResolution(String),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Result type alias for federation client operations.
pub type FederationResult<T> = std::result::Result<T, FederationError>;

/// Result type alias for HTTP fetches.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for security operations.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;
