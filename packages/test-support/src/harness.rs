//! Per-test composition of every isolation piece.
//!
//! A [`TestHarness`] resolves its parts in dependency order: environment
//! overlay, configuration, ephemeral engine, session, mock upstream. Each
//! call to [`TestHarness::client`] then builds a fresh application state
//! with the engine substituted and the session override installed. Dropping
//! the harness releases everything in reverse.

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use marquee::config::Config;
use marquee::db::{Database, Session};
use marquee::AppState;

use crate::client::TestClient;
use crate::db::{ephemeral_engine, FixedSession};
use crate::env::EnvOverlay;
use crate::error::TestError;
use crate::fixtures::generate::FakeMovie;
use crate::fixtures::{test_data_dir, tmdb};
use crate::upstream::MockTransport;

pub struct TestHarness {
    config: Config,
    db: Database,
    session: Session,
    upstream: Arc<MockTransport>,
    search_results: Vec<FakeMovie>,
    allow_unmatched: bool,
}

impl TestHarness {
    /// Harness over the default test environment.
    pub fn new() -> Result<Self, TestError> {
        Self::with_env(EnvOverlay::new())
    }

    pub fn with_env(overlay: EnvOverlay) -> Result<Self, TestError> {
        crate::logging::init();

        let config = overlay.load_config()?;
        let db = ephemeral_engine()?;
        let session = Session::open(&db);
        let upstream = Arc::new(MockTransport::new(config.tmdb.api_url.clone()));

        Ok(Self {
            config,
            db,
            session,
            upstream,
            search_results: Vec::new(),
            allow_unmatched: false,
        })
    }

    /// Mock TMDB search with ten generated movies.
    pub fn with_search_mock(mut self) -> Self {
        self.search_results = tmdb::mock_search(&self.upstream);
        self
    }

    /// Mock TMDB `/configuration`.
    pub fn with_configuration_mock(self) -> Self {
        tmdb::mock_configuration(&self.upstream);
        self
    }

    /// Mock TMDB movie details from the bundled `test_data/` payloads.
    pub fn with_movie_details_mock(self) -> Result<Self, TestError> {
        self.with_movie_details_from(&test_data_dir())
    }

    /// Mock TMDB movie details from `{dir}/{id}.json`.
    pub fn with_movie_details_from(self, dir: &Path) -> Result<Self, TestError> {
        tmdb::mock_movie_details(&self.upstream, dir)?;
        Ok(self)
    }

    /// Let clients shut down cleanly even if the application made upstream
    /// requests no route answered.
    pub fn allow_unmatched(mut self) -> Self {
        self.allow_unmatched = true;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// The session every request served by this harness's clients uses.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn upstream(&self) -> &MockTransport {
        &self.upstream
    }

    /// Results the search mock answers with, empty without the mock.
    pub fn search_results(&self) -> &[FakeMovie] {
        &self.search_results
    }

    /// Application state wired to the mock upstream, without overrides.
    pub fn base_state(&self) -> Result<AppState, TestError> {
        let transport = self.upstream.clone();
        Ok(AppState::new(self.config.clone(), self.db.clone(), transport)?)
    }

    /// Substitute this harness's engine into `base` and install the
    /// fixed-session override.
    pub fn isolate(&self, base: AppState) -> AppState {
        base.with_database(self.db.clone())
            .with_sessions(Arc::new(FixedSession::new(self.session.clone())))
    }

    pub fn state(&self) -> Result<AppState, TestError> {
        Ok(self.isolate(self.base_state()?))
    }

    /// Start a client over a freshly isolated state.
    ///
    /// Its shutdown fails with [`TestError::UnmatchedUpstream`] if any
    /// upstream request went unanswered, unless
    /// [`TestHarness::allow_unmatched`] was set. Prefer
    /// [`TestHarness::with_client`], which also guarantees shutdown.
    pub async fn client(&self) -> Result<TestClient, TestError> {
        let client = TestClient::start(self.state()?).await?;
        if self.allow_unmatched {
            return Ok(client);
        }
        Ok(client.deny_unmatched(self.upstream.clone()))
    }

    /// Run `body` against a started client, then shut the client down.
    ///
    /// Shutdown runs even if `body` panics; the panic is resumed afterwards.
    pub async fn with_client<F>(&self, body: F) -> Result<(), TestError>
    where
        F: for<'c> FnOnce(&'c TestClient) -> LocalBoxFuture<'c, ()>,
    {
        let client = self.client().await?;
        let outcome = AssertUnwindSafe(body(&client)).catch_unwind().await;
        let shutdown = client.shutdown().await;

        if let Err(panic) = outcome {
            std::panic::resume_unwind(panic);
        }
        shutdown
    }
}
