//! Marquee Backend Library
//!
//! A movie metadata API that proxies TMDB and caches what it fetches in
//! SQLite. This library exposes modules for use in integration tests.

use axum::response::Json;
use serde::Serialize;
use std::sync::Arc;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod services;

use config::Config;
use db::{Database, EngineSessions, SessionProvider};
use error::Result;
use services::tmdb::Transport;
use services::{ImageSettings, TmdbClient};

/// Application state shared across handlers.
///
/// Everything a request can reach lives here; nothing is read from globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// The engine lifecycle hooks and the default session provider use.
    pub db: Database,
    /// Where handlers obtain their database session.
    pub sessions: Arc<dyn SessionProvider>,
    pub tmdb_client: Arc<TmdbClient>,
    pub images: Arc<ImageSettings>,
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Build state whose TMDB calls go through `transport`.
    pub fn new(config: Config, db: Database, transport: Arc<dyn Transport>) -> Result<Self> {
        let tmdb_client = TmdbClient::new(&config.tmdb, transport)?;
        Ok(Self::assemble(config, db, tmdb_client))
    }

    /// Build state with a real HTTP client for TMDB.
    pub fn from_config(config: Config, db: Database) -> Result<Self> {
        let tmdb_client = TmdbClient::from_config(&config.tmdb)?;
        Ok(Self::assemble(config, db, tmdb_client))
    }

    fn assemble(config: Config, db: Database, tmdb_client: TmdbClient) -> Self {
        Self {
            config: Arc::new(config),
            sessions: Arc::new(EngineSessions::new(db.clone())),
            db,
            tmdb_client: Arc::new(tmdb_client),
            images: Arc::new(ImageSettings::new()),
            start_time: std::time::Instant::now(),
        }
    }

    /// Point this state at another engine.
    ///
    /// The session provider is reset to one that opens sessions on `db`, so
    /// install any session override after calling this.
    pub fn with_database(mut self, db: Database) -> Self {
        self.sessions = Arc::new(EngineSessions::new(db.clone()));
        self.db = db;
        self
    }

    /// Replace the provider handlers obtain sessions from.
    pub fn with_sessions(mut self, sessions: Arc<dyn SessionProvider>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Get a reference to the TMDB client.
    pub fn tmdb(&self) -> &TmdbClient {
        &self.tmdb_client
    }

    /// Get the start time of the application.
    pub fn start_time(&self) -> std::time::Instant {
        self.start_time
    }
}

#[derive(Serialize)]
pub struct ApiResponse {
    pub message: String,
    pub version: String,
}

pub async fn health_check() -> Json<ApiResponse> {
    Json(ApiResponse {
        message: "Marquee Backend is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
