// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use contactd_config::StorageConfig;
use contactd_core::ContactdError;
use rusqlite::ErrorCode;
use tokio_rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::{functions, migrations};

/// SQLite VM instructions between two checks of a call's cancel flag.
const PROGRESS_OPS: std::os::raw::c_int = 1_000;

/// Shared handle to the contactd SQLite database.
pub struct Database {
    conn: Connection,
    query_timeout: Option<Duration>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("query_timeout", &self.query_timeout)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open (or create) the database at `path` with default storage settings.
    pub async fn open(path: &str) -> Result<Self, ContactdError> {
        Self::open_with(&StorageConfig::at(path)).await
    }

    /// Open the configured database, apply PRAGMAs and run pending migrations.
    pub async fn open_with(config: &StorageConfig) -> Result<Self, ContactdError> {
        if let Some(parent) = std::path::Path::new(&config.database_path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| ContactdError::storage("create database directory", e))?;
        }

        let conn = Connection::open(&config.database_path)
            .await
            .map_err(|e| ContactdError::storage("open database", e))?;

        let wal_mode = config.wal_mode;
        let busy_timeout = config.busy_timeout();
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            }
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA synchronous = NORMAL; PRAGMA foreign_keys = ON;")?;
            functions::register(conn)
        })
        .await
        .map_err(|e| map_tr_err("configure database", e))?;

        let db = Self {
            conn,
            query_timeout: config.query_timeout(),
        };
        db.migrate().await?;
        info!(path = %config.database_path, wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database with the schema applied.
    pub async fn open_in_memory() -> Result<Self, ContactdError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| ContactdError::storage("open in-memory database", e))?;
        conn.call(|conn| functions::register(conn))
            .await
            .map_err(|e| map_tr_err("configure database", e))?;
        let db = Self {
            conn,
            query_timeout: None,
        };
        db.migrate().await?;
        Ok(db)
    }

    /// Bound every subsequent call by `timeout`. `None` removes the bound.
    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Apply pending migrations. Returns the number applied.
    pub async fn migrate(&self) -> Result<usize, ContactdError> {
        self.conn
            .call(migrations::run_migrations)
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Error(err) => err,
                other => ContactdError::storage("run migrations", other),
            })
    }

    /// Run `op` on the database thread.
    ///
    /// Dropping the returned future, or exceeding the query timeout, flags the
    /// call as cancelled; the progress handler then aborts the running
    /// statement, and a call that has not started yet is skipped. Nothing is
    /// retried.
    pub async fn call<F, R>(&self, context: &'static str, op: F) -> Result<R, ContactdError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, rusqlite::Error> + Send + 'static,
        R: Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let _guard = CancelOnDrop(Arc::clone(&cancelled));

        let fut = self
            .conn
            .call(move |conn| run_cancellable(conn, cancelled, op));

        let result = match self.query_timeout {
            Some(duration) => match tokio::time::timeout(duration, fut).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(operation = context, ?duration, "storage call timed out");
                    return Err(ContactdError::Timeout { duration });
                }
            },
            None => fut.await,
        };

        result.map_err(|e| map_tr_err(context, e))
    }

    /// Checkpoint the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), ContactdError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(|e| map_tr_err("checkpoint", e))?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    /// Checkpoint and close the connection.
    pub async fn close(self) -> Result<(), ContactdError> {
        self.checkpoint().await?;
        self.conn
            .close()
            .await
            .map_err(|e| ContactdError::storage("close database", e))
    }
}

/// Sets the shared cancel flag when the owning call future goes away.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

fn run_cancellable<F, R>(
    conn: &mut rusqlite::Connection,
    cancelled: Arc<AtomicBool>,
    op: F,
) -> Result<R, rusqlite::Error>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, rusqlite::Error>,
{
    if cancelled.load(Ordering::Acquire) {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_INTERRUPT),
            Some("call cancelled before it started".to_string()),
        ));
    }

    conn.progress_handler(
        PROGRESS_OPS,
        Some(move || cancelled.load(Ordering::Acquire)),
    );
    let result = op(conn);
    conn.progress_handler(PROGRESS_OPS, None::<fn() -> bool>);
    result
}

/// Convert a tokio-rusqlite error into a [`ContactdError`] with operation context.
///
/// Unique and primary-key violations become `Conflict`, CHECK violations
/// become `Validation`; everything else is an opaque storage error.
pub(crate) fn map_tr_err(
    context: &str,
    e: tokio_rusqlite::Error<rusqlite::Error>,
) -> ContactdError {
    if let tokio_rusqlite::Error::Error(rusqlite::Error::SqliteFailure(failure, message)) = &e
        && failure.code == ErrorCode::ConstraintViolation
    {
        let detail = message.clone().unwrap_or_else(|| failure.to_string());
        match failure.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return ContactdError::Conflict(format!("{context}: {detail}"));
            }
            rusqlite::ffi::SQLITE_CONSTRAINT_CHECK => {
                return ContactdError::Validation(format!("{context}: {detail}"));
            }
            _ => {}
        }
    }
    ContactdError::storage(context, e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("contactd.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let tables: Vec<String> = db
            .call("list tables", |conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' \
                     AND name IN ('contacts', 'bots') ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        assert_eq!(tables, vec!["bots", "contacts"]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_applies_no_migrations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contactd.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();

        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        assert_eq!(db.migrate().await.unwrap(), 0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn wal_mode_is_enabled_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        let mode: String = db
            .call("read journal mode", |conn| {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unique_violation_maps_to_conflict() {
        let db = Database::open_in_memory().await.unwrap();
        let insert = |id: &'static str| {
            move |conn: &mut rusqlite::Connection| {
                conn.execute(
                    "INSERT INTO bots (id, domain_id, flow_id, display_name, created_at, updated_at) \
                     VALUES (?1, 1, 7, '', 0, 0)",
                    [id],
                )
            }
        };
        db.call("insert bot", insert("a")).await.unwrap();
        let err = db.call("insert bot", insert("b")).await.unwrap_err();
        assert!(err.is_conflict(), "got {err}");
        assert!(err.to_string().contains("insert bot"));
    }

    #[tokio::test]
    async fn check_violation_maps_to_validation() {
        let db = Database::open_in_memory().await.unwrap();
        let err = db
            .call("insert bot", |conn| {
                conn.execute(
                    "INSERT INTO bots (id, domain_id, flow_id, display_name, created_at, updated_at) \
                     VALUES ('x', 1, 0, '', 0, 0)",
                    [],
                )
            })
            .await
            .unwrap_err();
        assert!(err.is_validation(), "got {err}");
    }

    fn spin_forever(conn: &mut rusqlite::Connection) -> Result<i64, rusqlite::Error> {
        conn.query_row(
            "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n) \
             SELECT count(*) FROM n",
            [],
            |row| row.get(0),
        )
    }

    async fn select_one(db: &Database) -> i64 {
        tokio::time::timeout(
            Duration::from_secs(5),
            db.call("select one", |conn| conn.query_row("SELECT 1", [], |row| row.get(0))),
        )
        .await
        .expect("connection still held by the abandoned statement")
        .unwrap()
    }

    #[tokio::test]
    async fn slow_statement_is_interrupted_by_timeout() {
        let db = Database::open_in_memory()
            .await
            .unwrap()
            .with_query_timeout(Some(Duration::from_millis(50)));

        let err = db.call("spin", spin_forever).await.unwrap_err();
        assert!(matches!(err, ContactdError::Timeout { .. }), "got {err}");

        let db = db.with_query_timeout(None);
        assert_eq!(select_one(&db).await, 1);
    }

    #[tokio::test]
    async fn dropping_an_in_flight_call_interrupts_it() {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let spinning = {
            let db = Arc::clone(&db);
            tokio::spawn(async move { db.call("spin", spin_forever).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        spinning.abort();
        assert!(spinning.await.unwrap_err().is_cancelled());

        assert_eq!(select_one(&db).await, 1);
    }
}
