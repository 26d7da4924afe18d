//! Ephemeral database engines and the fixed-session override.

use async_trait::async_trait;
use marquee::db::{Database, Session, SessionProvider};
use marquee::error::Result as AppResult;

use crate::error::TestError;

/// A brand-new in-memory engine.
///
/// Every clone of the returned handle reaches the same store, and the store
/// is discarded when the last handle is dropped. Tables are created by the
/// application's startup hook, not here.
pub fn ephemeral_engine() -> Result<Database, TestError> {
    let db = Database::in_memory()?;
    tracing::debug!("Ephemeral database created");
    Ok(db)
}

/// Session provider that hands the same session to every request.
///
/// Installing this on a test's state means handlers see exactly the rows the
/// test wrote through [`FixedSession::session`], and vice versa.
pub struct FixedSession {
    session: Session,
}

impl FixedSession {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl SessionProvider for FixedSession {
    async fn session(&self) -> AppResult<Session> {
        Ok(self.session.clone())
    }
}
