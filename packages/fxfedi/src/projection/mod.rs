//! Pure projections of [`Metadata`](crate::types::metadata::Metadata) into
//! the shapes link-unfurling consumers read. No I/O happens here.

pub mod fallback;
pub mod oembed;
pub mod tags;

pub use fallback::FallbackChain;
pub use oembed::{opted_out_oembed, to_oembed};
pub use tags::{display_name, error_tags, opted_out_tags, robots_disallowed_tags, to_tags};
