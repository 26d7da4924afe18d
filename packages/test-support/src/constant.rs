//! Fixed values every test environment starts from.
//!
//! None of these are real credentials or reachable hosts.

/// Placeholder TMDB bearer token.
pub static TEST_TMDB_API_TOKEN: &str = "TESTING";

/// Base URL the mocked TMDB upstream answers under.
///
/// Requests outside this prefix are rejected by [`crate::upstream::MockTransport`].
pub static TEST_TMDB_API_URL: &str = "http://tmdb.test/3";
