//! Generated and canned data for tests.

pub mod generate;
pub mod tmdb;

use std::path::PathBuf;

/// Directory holding the canned TMDB movie detail payloads.
pub fn test_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_data")
}
