// Fediverse link preview service - HTTP front end
//
// Thin axum layer over the fxfedi metadata pipeline: every route normalizes
// its input, runs the pipeline and renders tags or oEmbed as JSON.

pub mod config;
pub mod server;

pub use config::*;
