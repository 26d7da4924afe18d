use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestError {
    #[error(transparent)]
    Database(#[from] marquee::db::DbError),
    #[error(transparent)]
    App(#[from] marquee::error::AppError),
    #[error("failed to load fixture data from {path}: {source}")]
    FixtureData {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Pattern(#[from] regex::Error),
    #[error("test server failed: {0}")]
    Server(String),
    #[error("unexpected upstream requests: {}", .0.join(", "))]
    UnmatchedUpstream(Vec<String>),
}
