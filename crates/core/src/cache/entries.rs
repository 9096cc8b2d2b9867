//! Stored-response CRUD and partition operations.
//!
//! Provides functions for writing captured responses into named partitions,
//! reading them back by request identity, and enumerating or purging whole
//! partitions during activation and teardown.

use super::connection::CacheDb;
use super::hash::request_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A captured HTTP response stored in a cache partition.
///
/// The body is opaque bytes; `opaque` marks responses whose status and
/// headers could not be inspected but which may still be replayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResponse {
    pub partition: String,
    pub url: String,
    pub status: u16,
    pub opaque: bool,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl StoredResponse {
    /// Build a storable record for a GET response.
    pub fn new(partition: &str, url: &str, status: u16, opaque: bool, content_type: Option<String>, body: Vec<u8>) -> Self {
        Self {
            partition: partition.to_string(),
            url: url.to_string(),
            status,
            opaque,
            content_type,
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl CacheDb {
    /// Insert or update a stored response.
    ///
    /// Uses UPSERT semantics keyed on (partition, request identity):
    /// re-storing the same URL overwrites in place, never duplicates.
    /// Last write wins for concurrent stores of the same URL.
    pub async fn upsert_entry(&self, entry: &StoredResponse) -> Result<(), Error> {
        let entry = entry.clone();
        let hash = request_key("GET", &entry.url);
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                    partition, hash, url, status, opaque, content_type, body, stored_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(partition, hash) DO UPDATE SET
                    url = excluded.url,
                    status = excluded.status,
                    opaque = excluded.opaque,
                    content_type = excluded.content_type,
                    body = excluded.body,
                    stored_at = excluded.stored_at",
                    params![
                        &entry.partition,
                        &hash,
                        &entry.url,
                        entry.status as i32,
                        entry.opaque as i32,
                        &entry.content_type,
                        &entry.body,
                        &entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a stored response by partition and URL.
    ///
    /// Returns None on a cache miss.
    pub async fn get_entry(&self, partition: &str, url: &str) -> Result<Option<StoredResponse>, Error> {
        let partition = partition.to_string();
        let hash = request_key("GET", url);
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT partition, url, status, opaque, content_type, body, stored_at
                FROM entries WHERE partition = ?1 AND hash = ?2",
                )?;

                let result = stmt.query_row(params![partition, hash], |row| {
                    Ok(StoredResponse {
                        partition: row.get(0)?,
                        url: row.get(1)?,
                        status: row.get::<_, i32>(2)? as u16,
                        opaque: row.get::<_, i32>(3)? == 1,
                        content_type: row.get(4)?,
                        body: row.get(5)?,
                        stored_at: row.get(6)?,
                    })
                });

                match result {
                    Ok(e) => Ok(Some(e)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// List the names of all partitions that currently hold entries.
    pub async fn list_partitions(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT partition FROM entries ORDER BY partition")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Count the entries in one partition.
    pub async fn count_entries(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE partition = ?1",
                    params![partition],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one partition outright.
    ///
    /// Returns the number of deleted entries.
    pub async fn drop_partition(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM entries WHERE partition = ?1", params![partition])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every partition whose name is not in `keep`.
    ///
    /// This is the activation purge: after it completes, only the current
    /// version's partitions remain. Returns the number of deleted entries.
    pub async fn drop_partitions_not_in(&self, keep: &[String]) -> Result<u64, Error> {
        if keep.is_empty() {
            return self.drop_all_partitions().await;
        }
        let keep = keep.to_vec();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                // rusqlite has no array binding; the keep set is always the
                // three role names, so build the placeholder list directly.
                let placeholders = (1..=keep.len()).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ");
                let sql = format!("DELETE FROM entries WHERE partition NOT IN ({placeholders})");
                let count = conn.execute(&sql, rusqlite::params_from_iter(keep.iter()))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every partition. Used only by teardown mode.
    pub async fn drop_all_partitions(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM entries", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_entry(partition: &str, url: &str, body: &[u8]) -> StoredResponse {
        StoredResponse::new(partition, url, 200, false, Some("text/html".to_string()), body.to_vec())
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entry = make_entry("reelgate-static-v2", "http://localhost:3000/index.html", b"<html>");

        db.upsert_entry(&entry).await.unwrap();

        let retrieved = db
            .get_entry("reelgate-static-v2", "http://localhost:3000/index.html")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(retrieved.url, entry.url);
        assert_eq!(retrieved.body, entry.body);
        assert_eq!(retrieved.status, 200);
        assert!(!retrieved.opaque);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.get_entry("reelgate-static-v2", "http://localhost:3000/nope").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites_in_place() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let url = "http://localhost:3000/style.css";

        db.upsert_entry(&make_entry("reelgate-static-v2", url, b"old")).await.unwrap();
        db.upsert_entry(&make_entry("reelgate-static-v2", url, b"new")).await.unwrap();

        assert_eq!(db.count_entries("reelgate-static-v2").await.unwrap(), 1);
        let entry = db.get_entry("reelgate-static-v2", url).await.unwrap().unwrap();
        assert_eq!(entry.body, b"new");
    }

    #[tokio::test]
    async fn test_same_url_isolated_across_partitions() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let url = "https://image.tmdb.org/t/p/w500/poster.jpg";

        db.upsert_entry(&make_entry("reelgate-images-v1", url, b"v1")).await.unwrap();
        db.upsert_entry(&make_entry("reelgate-images-v2", url, b"v2")).await.unwrap();

        let old = db.get_entry("reelgate-images-v1", url).await.unwrap().unwrap();
        let new = db.get_entry("reelgate-images-v2", url).await.unwrap().unwrap();
        assert_eq!(old.body, b"v1");
        assert_eq!(new.body, b"v2");
    }

    #[tokio::test]
    async fn test_list_and_drop_partitions() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_entry(&make_entry("reelgate-static-v2", "http://localhost:3000/", b"a"))
            .await
            .unwrap();
        db.upsert_entry(&make_entry("reelgate-images-v2", "https://image.tmdb.org/x.jpg", b"b"))
            .await
            .unwrap();

        let names = db.list_partitions().await.unwrap();
        assert_eq!(names, vec!["reelgate-images-v2".to_string(), "reelgate-static-v2".to_string()]);

        let deleted = db.drop_partition("reelgate-images-v2").await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(db.list_partitions().await.unwrap(), vec!["reelgate-static-v2".to_string()]);
    }

    #[tokio::test]
    async fn test_drop_partitions_not_in_keep_set() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_entry(&make_entry("reelgate-static-v1", "http://localhost:3000/", b"old"))
            .await
            .unwrap();
        db.upsert_entry(&make_entry("reelgate-static-v2", "http://localhost:3000/", b"new"))
            .await
            .unwrap();
        db.upsert_entry(&make_entry("reelgate-runtime-v2", "https://fonts.gstatic.com/f.woff2", b"f"))
            .await
            .unwrap();

        let keep = vec![
            "reelgate-static-v2".to_string(),
            "reelgate-runtime-v2".to_string(),
            "reelgate-images-v2".to_string(),
        ];
        let deleted = db.drop_partitions_not_in(&keep).await.unwrap();
        assert_eq!(deleted, 1);

        let names = db.list_partitions().await.unwrap();
        assert!(!names.contains(&"reelgate-static-v1".to_string()));
        assert!(names.contains(&"reelgate-static-v2".to_string()));
    }

    #[tokio::test]
    async fn test_drop_all_partitions() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_entry(&make_entry("reelgate-static-v2", "http://localhost:3000/", b"a"))
            .await
            .unwrap();
        db.upsert_entry(&make_entry("reelgate-runtime-v2", "https://other.example/x", b"b"))
            .await
            .unwrap();

        let deleted = db.drop_all_partitions().await.unwrap();
        assert_eq!(deleted, 2);
        assert!(db.list_partitions().await.unwrap().is_empty());
    }
}
