//! Schema migrations for the partition store.
//!
//! Applied versions are recorded in a `_migrations` table; on open, every
//! migration newer than the recorded maximum runs as one SQL batch.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Ordered migration batches. Versions are monotonically increasing and
/// never reused; the SQL itself is idempotent (CREATE IF NOT EXISTS).
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_entries.sql"))];

/// Bring the schema up to date, applying any pending migrations.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        let applied = latest_applied(conn)?;

        for (version, sql) in MIGRATIONS {
            if *version <= applied {
                continue;
            }
            conn.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
            conn.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )
            .map_err(Error::from)?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

/// The highest applied version, creating the bookkeeping table on first use.
fn latest_applied(conn: &tokio_rusqlite::rusqlite::Connection) -> Result<i64, Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
        [],
    )
    .map_err(Error::from)?;

    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))
        .map_err(Error::from)
}
