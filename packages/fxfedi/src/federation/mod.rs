//! Reference [`FederationClient`](crate::traits::federation::FederationClient)
//! over unsigned ActivityStreams fetches.
//!
//! Servers that require authorized fetch will answer 401/403; those surface as
//! [`FederationError::Status`](crate::error::FederationError::Status).

mod activitypub;
mod json;

pub use activitypub::ActivityPubClient;
pub use json::decode_object;
