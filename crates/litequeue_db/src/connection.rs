//! Database connection management.

use std::path::Path;

use sqlx::sqlite::{SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::locator::{Locator, TRANSIENT_LOCATORS};
use crate::queries;

/// Connection to a queue's database.
///
/// Two queues opened against distinct locators never observe each other's
/// items; two opened against the same locator share them.
#[derive(Debug, Clone)]
pub struct QueueDb {
    pool: SqlitePool,
    locator: Locator,
}

impl QueueDb {
    /// Open or create the queue database named by `locator`.
    ///
    /// This will:
    /// 1. Purge the existing database file first if `reset` is set (file targets only)
    /// 2. Create the database file and its parent directory if they don't exist
    /// 3. Run any pending migrations
    /// 4. Configure SQLite for durable concurrent access (WAL mode, etc.)
    pub async fn open(locator: &Locator, reset: bool) -> DbResult<Self> {
        let pool = match locator {
            Locator::File(path) => {
                if reset {
                    purge_files(path)?;
                }

                // Ensure parent directory exists
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        std::fs::create_dir_all(parent)?;
                    }
                }

                info!("Opening queue database: {}", path.display());

                let options = locator
                    .connect_options()?
                    .journal_mode(SqliteJournalMode::Wal)
                    .pragma("synchronous", "NORMAL") // Safe with WAL
                    .pragma("temp_store", "MEMORY")
                    .busy_timeout(std::time::Duration::from_secs(5));

                SqlitePoolOptions::new()
                    .max_connections(4)
                    .connect_with(options)
                    .await?
            }
            Locator::Memory(name) => {
                debug!("Opening transient queue database: {}", name);

                // A shared-cache memory database is dropped when its last
                // connection closes, so pin one for the life of the pool.
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(locator.connect_options()?)
                    .await?
            }
        };

        debug!("Database connection established");

        Self::run_migrations(&pool).await?;

        Ok(Self {
            pool,
            locator: locator.clone(),
        })
    }

    /// Open a fresh transient database (for testing and anonymous queues).
    pub async fn open_in_memory() -> DbResult<Self> {
        Self::open(&TRANSIENT_LOCATORS.next(), false).await
    }

    /// Run database migrations.
    async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
        debug!("Running database migrations");
        sqlx::migrate!("./migrations").run(pool).await?;
        debug!("Database migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The target this database was opened against.
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Close the database connection.
    ///
    /// Safe to call more than once. Queries issued afterwards fail with a
    /// closed-pool error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Check if the database is healthy.
    pub async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get queue statistics.
    pub async fn stats(&self) -> DbResult<QueueStats> {
        let pending = queries::count_items(&self.pool).await?;
        let next_id = queries::next_item_id(&self.pool).await?;

        Ok(QueueStats {
            pending: pending as u64,
            next_id,
        })
    }

    /// Checkpoint the WAL file. Transient databases have no WAL.
    pub async fn checkpoint(&self) -> DbResult<()> {
        if self.locator.is_transient() {
            return Ok(());
        }
        debug!("Checkpointing WAL");
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Queue statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Items not yet deleted
    pub pending: u64,
    /// Key the next insert will receive
    pub next_id: i64,
}

/// Remove a database file and its WAL sidecars. Missing files are fine.
fn purge_files(path: &Path) -> DbResult<()> {
    info!("Resetting queue database: {}", path.display());

    let mut targets = vec![path.to_path_buf()];
    for suffix in ["-wal", "-shm"] {
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(suffix);
        targets.push(sidecar.into());
    }

    for target in targets {
        match std::fs::remove_file(&target) {
            Ok(()) => debug!("Removed {}", target.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = QueueDb::open_in_memory().await.unwrap();
        db.health_check().await.unwrap();
        assert!(db.locator().is_transient());

        let stats = db.stats().await.unwrap();
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.next_id, 1);
    }

    #[tokio::test]
    async fn test_transient_databases_are_isolated() {
        let a = QueueDb::open_in_memory().await.unwrap();
        let b = QueueDb::open_in_memory().await.unwrap();

        queries::insert_item(a.pool(), b"only in a").await.unwrap();

        assert_eq!(queries::count_items(a.pool()).await.unwrap(), 1);
        assert_eq!(queries::count_items(b.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_same_memory_name_is_shared() {
        let locator = Locator::Memory("connection-shared".into());
        let a = QueueDb::open(&locator, false).await.unwrap();
        let b = QueueDb::open(&locator, false).await.unwrap();

        queries::insert_item(a.pool(), b"seen by both").await.unwrap();
        assert_eq!(queries::count_items(b.pool()).await.unwrap(), 1);

        // The database outlives any one of its openers.
        a.close().await;
        assert_eq!(queries::count_items(b.pool()).await.unwrap(), 1);
        b.close().await;

        let fresh = QueueDb::open(&locator, false).await.unwrap();
        assert_eq!(queries::count_items(fresh.pool()).await.unwrap(), 0);
        fresh.close().await;
    }

    #[tokio::test]
    async fn test_file_database_persists_and_resets() {
        let temp_dir = TempDir::new().unwrap();
        let locator = Locator::File(temp_dir.path().join("nested").join("queue.db"));

        let db = QueueDb::open(&locator, false).await.unwrap();
        queries::insert_item(db.pool(), b"kept").await.unwrap();
        db.close().await;
        assert!(db.is_closed());

        let reopened = QueueDb::open(&locator, false).await.unwrap();
        assert_eq!(queries::count_items(reopened.pool()).await.unwrap(), 1);
        reopened.checkpoint().await.unwrap();
        reopened.close().await;

        let reset = QueueDb::open(&locator, true).await.unwrap();
        assert_eq!(queries::count_items(reset.pool()).await.unwrap(), 0);
        assert_eq!(reset.stats().await.unwrap().next_id, 1);
        reset.close().await;
    }

    #[tokio::test]
    async fn test_reset_on_missing_file_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let locator = Locator::File(temp_dir.path().join("fresh.db"));

        let db = QueueDb::open(&locator, true).await.unwrap();
        db.health_check().await.unwrap();
        db.close().await;
    }

    #[tokio::test]
    async fn test_queries_fail_after_close() {
        let db = QueueDb::open_in_memory().await.unwrap();
        db.close().await;
        db.close().await;

        let err = queries::count_items(db.pool()).await.unwrap_err();
        assert!(err.is_closed());
    }
}
