//! Seams to the collaborators the pipeline depends on.

pub mod federation;
pub mod fetcher;
