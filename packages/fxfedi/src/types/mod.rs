//! Data types shared across the pipeline.

pub mod config;
pub mod metadata;
pub mod object;
pub mod output;
pub mod normalized;
