//! Core types and shared functionality for reelgate.
//!
//! This crate provides:
//! - Versioned cache partition store with SQLite backend
//! - Request classification rules and caching strategies
//! - The cache manager lifecycle (install, activate, intercept)
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod worker;

pub use cache::{CacheDb, StoredResponse};
pub use config::{AppConfig, WorkerMode};
pub use error::Error;
pub use worker::{CacheManager, Classifier, Fetch, FetchedResponse, Lifecycle, PartitionNames};
