//! Client code for reelgate.
//!
//! This crate provides the outbound HTTP side of the gateway: the fetch
//! client the cache strategies pull assets through, and the TMDB client
//! backing the proxy endpoints.

pub mod fetch;
pub mod tmdb;

pub use fetch::{FetchClient, FetchConfig, UrlError, canonicalize};
pub use tmdb::{MediaType, TmdbClient, TmdbConfig, TmdbError, Upstream};
