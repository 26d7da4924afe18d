//! Database sessions and the injection point handlers use to obtain them.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use rusqlite::{Connection, Transaction};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::Database;
use crate::error::{AppError, Result};
use crate::AppState;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// A unit of work bound to one [`Database`].
///
/// Clones share the session; it closes when the last clone is dropped or
/// [`Session::close`] consumes it. Values returned from a committed
/// [`Session::transaction`] are owned, so they stay readable after commit.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    id: u64,
    db: Database,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        tracing::debug!(session_id = self.id, "Session closed");
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.inner.id).finish()
    }
}

impl Session {
    /// Open a new session on `db`.
    pub fn open(db: &Database) -> Self {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(session_id = id, "Session opened");
        Self {
            inner: Arc::new(SessionInner {
                id,
                db: db.clone(),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The engine this session is bound to.
    pub fn database(&self) -> &Database {
        &self.inner.db
    }

    /// Run `f` against the connection outside of an explicit transaction.
    pub async fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.inner.db.lock().await;
        f(&conn)
    }

    /// Run `f` inside a transaction, committing on `Ok` and rolling back on `Err`.
    pub async fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.inner.db.lock().await;
        let tx = conn.transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                tracing::debug!(session_id = self.inner.id, error = %e, "Rolling back transaction");
                tx.rollback()?;
                Err(e)
            }
        }
    }

    /// Close this handle of the session.
    pub fn close(self) {
        drop(self);
    }
}

/// Source of sessions for inbound requests.
///
/// Handlers never open sessions themselves; they go through the provider held
/// in [`AppState`], so a different provider can be installed per state.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn session(&self) -> Result<Session>;
}

/// Opens a fresh session on the engine for every request.
pub struct EngineSessions {
    db: Database,
}

impl EngineSessions {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionProvider for EngineSessions {
    async fn session(&self) -> Result<Session> {
        Ok(Session::open(&self.db))
    }
}

/// Extractor resolving the request's session through `AppState::sessions`.
pub struct DbSession(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for DbSession {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        state.sessions.session().await.map(DbSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn scratch_db() -> Database {
        let db = Database::in_memory().unwrap();
        db.lock()
            .await
            .execute_batch("CREATE TABLE scratch (x INTEGER NOT NULL);")
            .unwrap();
        db
    }

    async fn count(session: &Session) -> i64 {
        session
            .read(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM scratch", [], |row| row.get(0))?))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_transaction_commits_on_ok() {
        let db = scratch_db().await;
        let session = Session::open(&db);

        let inserted = session
            .transaction(|tx| Ok(tx.execute("INSERT INTO scratch (x) VALUES (1)", [])?))
            .await
            .unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(count(&session).await, 1);
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_err() {
        let db = scratch_db().await;
        let session = Session::open(&db);

        let result: Result<()> = session
            .transaction(|tx| {
                tx.execute("INSERT INTO scratch (x) VALUES (1)", [])?;
                Err(AppError::BadRequest("abort".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(count(&session).await, 0);
    }

    #[tokio::test]
    async fn test_sessions_on_same_engine_see_each_other() {
        let db = scratch_db().await;
        let writer = Session::open(&db);
        let reader = Session::open(&db);
        assert_ne!(writer.id(), reader.id());

        writer
            .transaction(|tx| Ok(tx.execute("INSERT INTO scratch (x) VALUES (2)", [])?))
            .await
            .unwrap();

        assert_eq!(count(&reader).await, 1);
    }

    #[tokio::test]
    async fn test_close_releases_only_this_handle() {
        let db = scratch_db().await;
        let session = Session::open(&db);
        let other = session.clone();

        session.close();

        other
            .transaction(|tx| Ok(tx.execute("INSERT INTO scratch (x) VALUES (3)", [])?))
            .await
            .unwrap();
        assert_eq!(count(&other).await, 1);
    }

    #[tokio::test]
    async fn test_engine_sessions_open_distinct_sessions() {
        let db = scratch_db().await;
        let provider = EngineSessions::new(db.clone());

        let a = provider.session().await.unwrap();
        let b = provider.session().await.unwrap();

        assert_ne!(a.id(), b.id());
        assert!(a.database().same_engine(&db));
    }
}
