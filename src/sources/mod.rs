//! Remote release document sources.

mod fetcher;

#[cfg(feature = "remote")]
mod http;

pub use fetcher::{FetchError, Fetcher};

#[cfg(feature = "remote")]
pub use http::{HttpAuth, HttpFetcher, HttpFetcherBuilder};
