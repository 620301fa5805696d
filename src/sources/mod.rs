//! Library sources.
//!
//! Fetchers are responsible for getting library archives onto disk
//! (HTTP downloads, local files) and for removing them again.

pub mod archive;
pub mod fetcher;
pub mod http;

pub use fetcher::{FetchError, Fetcher, RemovalError};
pub use http::HttpFetcher;
