//! Cache manager lifecycle: install, activate, intercept, teardown.
//!
//! One concrete type implements the three lifecycle hooks; a thin adapter
//! in the server crate registers them with the HTTP host. Activation must
//! complete before the host starts routing intercepted requests — the
//! server enforces this by binding its listener only afterwards.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use super::classify::{Classifier, Decision, RequestInfo, Strategy};
use super::strategies::{self, Fetch, Source};
use crate::Error;
use crate::cache::{CacheDb, StoredResponse};

/// The three lifecycle hooks of the offline cache layer.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Precache the app-shell manifest into the static partition.
    async fn on_install(&self) -> Result<(), Error>;

    /// Purge partitions from previous versions.
    async fn on_activate(&self) -> Result<(), Error>;

    /// Handle one outgoing request, or decline it.
    async fn intercept(&self, req: &RequestInfo) -> Result<Intercept, Error>;
}

/// Outcome of intercepting a request.
#[derive(Debug)]
pub enum Intercept {
    /// Not ours: non-GET or classified bypass. The caller talks to the
    /// network directly and sees its errors unfiltered.
    PassThrough,
    /// Served by a strategy, from the given source.
    Respond { response: StoredResponse, source: Source },
}

/// The offline cache manager.
pub struct CacheManager {
    db: CacheDb,
    fetcher: Arc<dyn Fetch>,
    classifier: Classifier,
    manifest: Vec<Url>,
}

impl CacheManager {
    /// Build a manager. Manifest paths are resolved against the shell origin.
    pub fn new(
        db: CacheDb, fetcher: Arc<dyn Fetch>, classifier: Classifier, manifest_paths: &[String],
    ) -> Result<Self, Error> {
        let manifest = manifest_paths
            .iter()
            .map(|path| {
                classifier
                    .shell_origin()
                    .join(path)
                    .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { db, fetcher, classifier, manifest })
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Delete every partition. This is the explicit retirement mode for a
    /// previous deployment; it is never run as part of normal serving.
    pub async fn teardown(&self) -> Result<u64, Error> {
        let deleted = self.db.drop_all_partitions().await?;
        tracing::info!(deleted, "teardown complete, all partitions dropped");
        Ok(deleted)
    }
}

#[async_trait]
impl Lifecycle for CacheManager {
    async fn on_install(&self) -> Result<(), Error> {
        let partition = self.classifier.partitions().static_assets();
        let mut precached = 0usize;

        for url in &self.manifest {
            match self.fetcher.fetch(url, true).await {
                Ok(resp) if resp.is_storable() => {
                    let entry = resp.into_stored(&partition, url);
                    match self.db.upsert_entry(&entry).await {
                        Ok(()) => precached += 1,
                        Err(e) => tracing::warn!(url = %url, error = %e, "precache write failed, skipping"),
                    }
                }
                Ok(resp) => {
                    tracing::warn!(url = %url, status = resp.status, "precache fetch not cacheable, skipping");
                }
                Err(e) => tracing::warn!(url = %url, error = %e, "precache fetch failed, skipping"),
            }
        }

        tracing::info!(precached, total = self.manifest.len(), partition, "install complete");
        Ok(())
    }

    async fn on_activate(&self) -> Result<(), Error> {
        let keep = self.classifier.partitions().keep_set();
        let deleted = self.db.drop_partitions_not_in(&keep).await?;
        tracing::info!(deleted, keep = ?keep, "activation purge complete");
        Ok(())
    }

    async fn intercept(&self, req: &RequestInfo) -> Result<Intercept, Error> {
        if req.method != "GET" {
            return Ok(Intercept::PassThrough);
        }

        let (strategy, partition) = match self.classifier.classify(req) {
            Decision::Bypass => return Ok(Intercept::PassThrough),
            Decision::Handle { strategy, partition } => (strategy, partition),
        };

        let (response, source) = match strategy {
            Strategy::CacheFirst => strategies::cache_first(&self.db, &self.fetcher, &partition, &req.url).await?,
            Strategy::NetworkFirst => {
                let shell_root = self.classifier.shell_root();
                strategies::network_first(&self.db, &self.fetcher, &partition, &req.url, &shell_root).await?
            }
            Strategy::StaleWhileRevalidate => {
                strategies::stale_while_revalidate(&self.db, &self.fetcher, &partition, &req.url).await?
            }
        };

        tracing::debug!(url = %req.url, ?strategy, ?source, partition, "request served");
        Ok(Intercept::Respond { response, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::StoredResponse;
    use crate::config::AppConfig;
    use crate::worker::strategies::tests::MockFetch;

    fn classifier() -> Classifier {
        Classifier::from_config(&AppConfig::default()).unwrap()
    }

    fn manager(db: &CacheDb, mock: &Arc<MockFetch>, manifest: &[&str]) -> CacheManager {
        let paths: Vec<String> = manifest.iter().map(|s| s.to_string()).collect();
        CacheManager::new(db.clone(), Arc::clone(mock) as Arc<dyn Fetch>, classifier(), &paths).unwrap()
    }

    async fn seed(db: &CacheDb, partition: &str, url: &str, body: &[u8]) {
        db.upsert_entry(&StoredResponse::new(partition, url, 200, false, None, body.to_vec()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_install_precaches_manifest() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mock = MockFetch::new(vec![MockFetch::ok(b"root"), MockFetch::ok(b"index")]);
        let mgr = manager(&db, &mock, &["/", "/index.html"]);

        mgr.on_install().await.unwrap();

        assert_eq!(db.count_entries("reelgate-static-v2").await.unwrap(), 2);
        let root = db
            .get_entry("reelgate-static-v2", "http://localhost:3000/")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(root.body, b"root");
    }

    #[tokio::test]
    async fn test_install_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mock = MockFetch::new(vec![
            MockFetch::ok(b"a"),
            MockFetch::ok(b"b"),
            MockFetch::ok(b"a2"),
            MockFetch::ok(b"b2"),
        ]);
        let mgr = manager(&db, &mock, &["/", "/index.html"]);

        mgr.on_install().await.unwrap();
        mgr.on_install().await.unwrap();

        // One entry per manifest URL, no duplicates.
        assert_eq!(db.count_entries("reelgate-static-v2").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_install_survives_partial_failure() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mock = MockFetch::new(vec![MockFetch::ok(b"root"), MockFetch::down(), MockFetch::status(404)]);
        let mgr = manager(&db, &mock, &["/", "/style.css", "/script.js"]);

        mgr.on_install().await.unwrap();

        // The failed and uncacheable entries are skipped, the rest stored.
        assert_eq!(db.count_entries("reelgate-static-v2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_activate_purges_stale_versions() {
        let db = CacheDb::open_in_memory().await.unwrap();
        seed(&db, "reelgate-static-v1", "http://localhost:3000/", b"old").await;
        seed(&db, "reelgate-static-v2", "http://localhost:3000/", b"new").await;
        seed(&db, "reelgate-images-v1", "https://image.tmdb.org/a.jpg", b"old-art").await;

        let mock = MockFetch::new(vec![]);
        let mgr = manager(&db, &mock, &[]);
        mgr.on_activate().await.unwrap();

        let names = db.list_partitions().await.unwrap();
        assert_eq!(names, vec!["reelgate-static-v2".to_string()]);
    }

    #[tokio::test]
    async fn test_install_then_activate_end_to_end() {
        let db = CacheDb::open_in_memory().await.unwrap();
        // Stale leftover from the previous deployment.
        seed(&db, "reelgate-static-v1", "http://localhost:3000/", b"old").await;

        let mock = MockFetch::new(vec![MockFetch::ok(b"root"), MockFetch::ok(b"index")]);
        let mgr = manager(&db, &mock, &["/", "/index.html"]);

        mgr.on_install().await.unwrap();
        assert_eq!(db.count_entries("reelgate-static-v2").await.unwrap(), 2);

        mgr.on_activate().await.unwrap();
        let names = db.list_partitions().await.unwrap();
        assert_eq!(names, vec!["reelgate-static-v2".to_string()]);
        assert!(classifier().partitions().keep_set().contains(&names[0]));
    }

    #[tokio::test]
    async fn test_intercept_passes_through_non_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mock = MockFetch::new(vec![]);
        let mgr = manager(&db, &mock, &[]);

        let mut req = RequestInfo::get(Url::parse("http://localhost:3000/script.js").unwrap());
        req.method = "POST".to_string();

        assert!(matches!(mgr.intercept(&req).await.unwrap(), Intercept::PassThrough));
        assert_eq!(mock.call_count(), 0);
        assert!(db.list_partitions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_intercept_bypasses_api_and_upstream_without_touching_storage() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mock = MockFetch::new(vec![]);
        let mgr = manager(&db, &mock, &[]);

        for target in [
            "http://localhost:3000/api/search?query=dune",
            "https://api.themoviedb.org/3/genre/movie/list",
        ] {
            let req = RequestInfo::get(Url::parse(target).unwrap());
            assert!(matches!(mgr.intercept(&req).await.unwrap(), Intercept::PassThrough));
        }

        assert_eq!(mock.call_count(), 0);
        assert!(db.list_partitions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_intercept_serves_image_cache_first() {
        let db = CacheDb::open_in_memory().await.unwrap();
        seed(&db, "reelgate-images-v2", "https://image.tmdb.org/t/p/w500/p.jpg", b"art").await;

        let mock = MockFetch::new(vec![]);
        let mgr = manager(&db, &mock, &[]);

        let req = RequestInfo::get(Url::parse("https://image.tmdb.org/t/p/w500/p.jpg").unwrap());
        match mgr.intercept(&req).await.unwrap() {
            Intercept::Respond { response, source } => {
                assert_eq!(response.body, b"art");
                assert_eq!(source, Source::Cache);
            }
            Intercept::PassThrough => panic!("expected a cached response"),
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_intercept_navigation_falls_back_to_shell_when_offline() {
        let db = CacheDb::open_in_memory().await.unwrap();
        seed(&db, "reelgate-static-v2", "http://localhost:3000/", b"shell").await;

        let mock = MockFetch::new(vec![MockFetch::down()]);
        let mgr = manager(&db, &mock, &[]);

        let req = RequestInfo::navigate(Url::parse("http://localhost:3000/deep/link").unwrap());
        match mgr.intercept(&req).await.unwrap() {
            Intercept::Respond { response, .. } => assert_eq!(response.body, b"shell"),
            Intercept::PassThrough => panic!("expected the cached shell"),
        }
    }

    #[tokio::test]
    async fn test_teardown_drops_everything() {
        let db = CacheDb::open_in_memory().await.unwrap();
        seed(&db, "reelgate-static-v2", "http://localhost:3000/", b"a").await;
        seed(&db, "reelgate-runtime-v1", "https://other.example/x", b"b").await;

        let mock = MockFetch::new(vec![]);
        let mgr = manager(&db, &mock, &[]);

        let deleted = mgr.teardown().await.unwrap();
        assert_eq!(deleted, 2);
        assert!(db.list_partitions().await.unwrap().is_empty());
    }
}
