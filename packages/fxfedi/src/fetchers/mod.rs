//! [`Fetcher`](crate::traits::fetcher::Fetcher) implementations.

mod http;

pub use http::HttpFetcher;
