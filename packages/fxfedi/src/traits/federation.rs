//! Federation object client trait.

use async_trait::async_trait;
use url::Url;

use crate::error::FederationResult;
use crate::types::object::RemoteObject;

/// Looks up ActivityStreams objects by URL.
///
/// Signed fetches, key management and caching are the implementor's business;
/// the pipeline only needs this one lookup.
#[async_trait]
pub trait FederationClient: Send + Sync {
    /// Resolve the object at `url`. `Ok(None)` means nothing is there.
    async fn resolve_object(&self, url: &Url) -> FederationResult<Option<RemoteObject>>;
}
