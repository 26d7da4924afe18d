//! Database module for the Marquee application.
//!
//! Provides the shared engine handle, migrations, sessions, and the movie
//! cache queries.

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

pub mod models;
pub mod movies;
mod session;

pub use session::{DbSession, EngineSessions, Session, SessionProvider};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("src/db/migrations");
}

/// Path value that selects a volatile in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] refinery::Error),
}

/// Handle to the application's database engine.
///
/// Every clone shares the same underlying connection, so an in-memory
/// database is one consistent store for all holders of the handle.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("handles", &Arc::strong_count(&self.conn))
            .finish()
    }
}

/// Configure connection with recommended pragmas
fn configure_connection(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

impl Database {
    /// Open a file-backed database, or an in-memory one for `:memory:`.
    ///
    /// Migrations are not run here; see [`Database::migrate`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let path = path.as_ref();
        if path == Path::new(MEMORY_PATH) {
            return Self::in_memory();
        }

        let conn = Connection::open(path)?;
        configure_connection(&conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Open a volatile database that lives as long as its last handle.
    pub fn in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        configure_connection(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Apply pending embedded migrations.
    pub async fn migrate(&self) -> Result<(), DbError> {
        let mut conn = self.conn.lock().await;
        let report = embedded::migrations::runner().run(&mut *conn)?;
        for migration in report.applied_migrations() {
            tracing::info!(
                version = migration.version(),
                name = migration.name(),
                "Applied migration"
            );
        }
        Ok(())
    }

    /// Lock the shared connection.
    pub async fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().await
    }

    /// Whether both handles point at the same engine.
    pub fn same_engine(&self, other: &Database) -> bool {
        Arc::ptr_eq(&self.conn, &other.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrate_creates_movies_table() {
        let db = Database::in_memory().expect("Failed to open in-memory database");
        db.migrate().await.expect("Failed to migrate");

        let conn = db.lock().await;
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"movies".to_string()));
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let db = Database::in_memory().unwrap();
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_one_store() {
        let db = Database::in_memory().unwrap();
        let other = db.clone();
        assert!(db.same_engine(&other));

        db.lock()
            .await
            .execute_batch("CREATE TABLE scratch (x INTEGER); INSERT INTO scratch VALUES (7);")
            .unwrap();

        let x: i64 = other
            .lock()
            .await
            .query_row("SELECT x FROM scratch", [], |row| row.get(0))
            .unwrap();
        assert_eq!(x, 7);
    }

    #[tokio::test]
    async fn test_separate_in_memory_databases_are_isolated() {
        let a = Database::in_memory().unwrap();
        let b = Database::in_memory().unwrap();
        assert!(!a.same_engine(&b));

        a.lock()
            .await
            .execute_batch("CREATE TABLE scratch (x INTEGER);")
            .unwrap();

        let exists: bool = b
            .lock()
            .await
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE name = 'scratch')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(!exists);
    }

    #[tokio::test]
    async fn test_open_memory_path() {
        let db = Database::open(MEMORY_PATH).unwrap();
        db.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = Database::in_memory().unwrap();
        let fk_enabled: i32 = db
            .lock()
            .await
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();

        assert_eq!(fk_enabled, 1, "Foreign keys should be enabled");
    }
}
