//! Caching strategies.
//!
//! Each strategy operates on a single partition and a single GET request:
//!
//! - cache-first: stored copy wins; the network is only consulted on a miss
//! - network-first: fresh response wins; stored copy (then the stored root
//!   document) is the fallback on transport failure
//! - stale-while-revalidate: stored copy is served immediately while a
//!   detached background fetch refreshes it for next time
//!
//! Partition writes are best-effort everywhere: a failed write is logged
//! and the outer request still succeeds. There are no retries.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::task::JoinHandle;
use url::Url;

use crate::Error;
use crate::cache::{CacheDb, StoredResponse};

/// The network seam used by the strategies and the manager.
///
/// `revalidate` forces an end-to-end revalidation fetch (install-time
/// precache must not be satisfied from a stale intermediary copy).
///
/// Implementations return HTTP error statuses as `Ok` responses so the
/// caller can forward them; `Err` means the network itself failed.
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    async fn fetch(&self, url: &Url, revalidate: bool) -> Result<FetchedResponse, Error>;
}

/// A response as it came off the network.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: u16,
    /// Cross-origin response whose status/headers could not be inspected.
    pub opaque: bool,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchedResponse {
    /// Only successful or opaque responses may be written to a partition.
    pub fn is_storable(&self) -> bool {
        (200..300).contains(&self.status) || self.opaque
    }

    /// Convert into a partition record.
    pub fn into_stored(self, partition: &str, url: &Url) -> StoredResponse {
        StoredResponse::new(partition, url.as_str(), self.status, self.opaque, self.content_type, self.body.to_vec())
    }
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Network,
}

/// Write a storable response into a partition, swallowing failures.
async fn store_best_effort(db: &CacheDb, partition: &str, url: &Url, resp: &FetchedResponse) {
    if !resp.is_storable() {
        return;
    }
    let entry = resp.clone().into_stored(partition, url);
    if let Err(e) = db.upsert_entry(&entry).await {
        tracing::debug!(url = %url, partition, error = %e, "partition write failed, ignoring");
    }
}

/// Cache-first: return the stored response if present; otherwise fetch once,
/// store if cacheable, and return the network response.
pub async fn cache_first(
    db: &CacheDb, fetcher: &Arc<dyn Fetch>, partition: &str, url: &Url,
) -> Result<(StoredResponse, Source), Error> {
    if let Some(hit) = db.get_entry(partition, url.as_str()).await? {
        return Ok((hit, Source::Cache));
    }

    let resp = fetcher.fetch(url, false).await?;
    store_best_effort(db, partition, url, &resp).await;
    Ok((resp.into_stored(partition, url), Source::Network))
}

/// Network-first: fetch, store if cacheable, and return. On transport
/// failure fall back to the stored copy, then to the stored root document,
/// then propagate the original error.
pub async fn network_first(
    db: &CacheDb, fetcher: &Arc<dyn Fetch>, partition: &str, url: &Url, shell_root: &Url,
) -> Result<(StoredResponse, Source), Error> {
    match fetcher.fetch(url, false).await {
        Ok(resp) => {
            store_best_effort(db, partition, url, &resp).await;
            Ok((resp.into_stored(partition, url), Source::Network))
        }
        Err(err) => {
            if let Some(hit) = db.get_entry(partition, url.as_str()).await? {
                return Ok((hit, Source::Cache));
            }
            if let Some(shell) = db.get_entry(partition, shell_root.as_str()).await? {
                return Ok((shell, Source::Cache));
            }
            Err(err)
        }
    }
}

/// Stale-while-revalidate: serve the stored copy immediately and refresh it
/// in the background; on a miss, wait for the network.
pub async fn stale_while_revalidate(
    db: &CacheDb, fetcher: &Arc<dyn Fetch>, partition: &str, url: &Url,
) -> Result<(StoredResponse, Source), Error> {
    let (served, _revalidation) = swr_with_handle(db, fetcher, partition, url).await?;
    Ok(served)
}

/// Handle-returning variant so tests can await the background revalidation
/// deterministically. Production callers drop the handle: revalidations run
/// to completion or failure independently of the originating request.
pub(crate) async fn swr_with_handle(
    db: &CacheDb, fetcher: &Arc<dyn Fetch>, partition: &str, url: &Url,
) -> Result<((StoredResponse, Source), Option<JoinHandle<()>>), Error> {
    match db.get_entry(partition, url.as_str()).await? {
        Some(hit) => {
            let db = db.clone();
            let fetcher = Arc::clone(fetcher);
            let partition = partition.to_string();
            let url = url.clone();
            let handle = tokio::spawn(async move {
                match fetcher.fetch(&url, false).await {
                    Ok(resp) => store_best_effort(&db, &partition, &url, &resp).await,
                    Err(e) => tracing::debug!(url = %url, error = %e, "background revalidation failed"),
                }
            });
            Ok(((hit, Source::Cache), Some(handle)))
        }
        None => {
            let resp = fetcher.fetch(url, false).await?;
            store_best_effort(db, partition, url, &resp).await;
            Ok(((resp.into_stored(partition, url), Source::Network), None))
        }
    }
}
