//! The offline cache manager.
//!
//! This module is the policy core of the gateway. It provides:
//!
//! - `classify`: the ordered, stateless request classification rules that
//!   pick a strategy and a target partition per request
//! - `strategies`: cache-first, network-first, and stale-while-revalidate,
//!   each operating on one partition and one request
//! - `manager`: the install/activate/intercept lifecycle and teardown mode
//!
//! All state is either the immutable classifier configuration built at
//! startup or the shared partition store; nothing here mutates rule order
//! or partition names at runtime.

pub mod classify;
pub mod manager;
pub mod strategies;

pub use classify::{Classifier, Decision, Destination, PartitionNames, RequestInfo, Strategy};
pub use manager::{CacheManager, Intercept, Lifecycle};
pub use strategies::{Fetch, FetchedResponse, Source};
