//! Test client running the application's lifecycle hooks around a test server.

use axum_test::TestServer;
use std::sync::Arc;

use marquee::{api, lifecycle, AppState};

use crate::error::TestError;
use crate::upstream::MockTransport;

/// In-process client for the full application router.
///
/// [`TestClient::start`] runs the startup hook (migrations included) before
/// the server exists, and [`TestClient::shutdown`] runs the shutdown hook.
/// The client owns the state it was started with, so any override installed
/// on that state lives exactly as long as the client.
pub struct TestClient {
    server: TestServer,
    state: AppState,
    upstream: Option<Arc<MockTransport>>,
    shut_down: bool,
}

impl TestClient {
    pub async fn start(state: AppState) -> Result<Self, TestError> {
        lifecycle::startup(&state).await?;

        let server = TestServer::new(api::router(state.clone()))
            .map_err(|e| TestError::Server(e.to_string()))?;

        Ok(Self {
            server,
            state,
            upstream: None,
            shut_down: false,
        })
    }

    /// Fail [`TestClient::shutdown`] if `upstream` saw requests no route answered.
    pub fn deny_unmatched(mut self, upstream: Arc<MockTransport>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    pub fn server(&self) -> &TestServer {
        &self.server
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the shutdown hook and release the state.
    ///
    /// The hook always runs; unmatched upstream requests are reported after it.
    pub async fn shutdown(mut self) -> Result<(), TestError> {
        self.shut_down = true;
        lifecycle::shutdown(&self.state).await?;

        let unmatched = self
            .upstream
            .as_ref()
            .map(|upstream| upstream.unmatched())
            .unwrap_or_default();
        if !unmatched.is_empty() {
            return Err(TestError::UnmatchedUpstream(unmatched));
        }
        Ok(())
    }
}

impl Drop for TestClient {
    fn drop(&mut self) {
        if !self.shut_down {
            tracing::warn!("TestClient dropped without shutdown; shutdown hook did not run");
        }
    }
}
