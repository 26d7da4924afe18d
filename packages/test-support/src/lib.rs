//! Test isolation for the Marquee backend.
//!
//! Every test gets its own configuration overlay, in-memory database,
//! session, mocked TMDB upstream and test server. Nothing is shared between
//! tests and nothing touches the process environment or the network.
//!
//! ```no_run
//! use futures::FutureExt;
//! use marquee_test_support::prelude::*;
//!
//! # async fn example() -> Result<(), TestError> {
//! let harness = TestHarness::new()?.with_search_mock();
//! harness
//!     .with_client(|client| {
//!         async move {
//!             let response = client.server().get("/api/search?query=dune").await;
//!             response.assert_status_ok();
//!         }
//!         .boxed_local()
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod constant;
pub mod db;
pub mod env;
pub mod error;
pub mod fixtures;
pub mod harness;
pub mod logging;
pub mod upstream;

pub use client::TestClient;
pub use error::TestError;
pub use harness::TestHarness;

pub mod prelude {
    pub use crate::{
        constant::{TEST_TMDB_API_TOKEN, TEST_TMDB_API_URL},
        env::EnvOverlay,
        fixtures::generate::{fake_movies, FakeMovie},
        logging::LogCapture,
        upstream::MockTransport,
        TestClient, TestError, TestHarness,
    };
}
