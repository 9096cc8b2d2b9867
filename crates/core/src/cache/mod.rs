//! SQLite-backed store for versioned cache partitions.
//!
//! This module provides the persistent backing for the cache manager's
//! named partitions, using SQLite with async access via tokio-rusqlite.
//! It supports:
//!
//! - Request-identity keys (SHA-256 of method + canonical URL)
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Partition enumeration and version-based purging

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::StoredResponse;
