// HTTP routes
pub mod health;
pub mod metadata;
pub mod oembed;

pub use health::*;
pub use metadata::*;
pub use oembed::*;

use axum::http::{header::USER_AGENT, HeaderMap};

/// The requester's User-Agent, if it sent a readable one.
pub(crate) fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|agent| !agent.is_empty())
}
