//! Configuration module for the Marquee backend.
//!
//! Loads configuration from `config.toml` with environment variable overrides.

use config::{Config as ConfigLoader, Environment, File, Map};
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::AppError;

/// Well-known variable holding the TMDB API read access token.
pub const TMDB_API_TOKEN_VAR: &str = "TMDB_API_TOKEN";
/// Well-known variable overriding the TMDB API base URL.
pub const TMDB_API_URL_VAR: &str = "TMDB_API_URL";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub tmdb: TmdbConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by CORS; empty means same-origin only.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:` for a volatile database.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/marquee.db")
}

/// TMDB API configuration
#[derive(Clone, Deserialize)]
pub struct TmdbConfig {
    #[serde(default = "default_tmdb_url")]
    pub api_url: String,
    pub api_token: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// How long a cached movie is served before it is refetched.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

// Custom Debug implementation to avoid exposing api_token
impl std::fmt::Debug for TmdbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbConfig")
            .field("api_url", &self.api_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .finish()
    }
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_url: default_tmdb_url(),
            api_token: None,
            timeout_secs: default_timeout(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_tmdb_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_cache_ttl() -> u64 {
    24 * 60 * 60
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `config.toml` in current directory (optional)
    /// 3. Environment variables with `MARQUEE_` prefix
    /// 4. `TMDB_API_TOKEN` / `TMDB_API_URL`
    ///
    /// Environment variables use double underscore for nesting:
    /// - `MARQUEE_SERVER__PORT=9000` sets `server.port`
    /// - `MARQUEE_DATABASE__PATH=/data/db.sqlite` sets `database.path`
    pub fn load() -> Result<Self, AppError> {
        Self::load_from("config.toml")
    }

    /// Load configuration from a specific file path.
    pub fn load_from(config_path: &str) -> Result<Self, AppError> {
        Self::load_with_env(Some(config_path), std::env::vars().collect())
    }

    /// Load configuration reading environment variables from `env` instead of
    /// the process environment. With no `config_path`, no file is consulted.
    pub fn load_with_env(
        config_path: Option<&str>,
        env: Map<String, String>,
    ) -> Result<Self, AppError> {
        let token = env.get(TMDB_API_TOKEN_VAR).cloned();
        let api_url = env.get(TMDB_API_URL_VAR).cloned();

        let mut builder = ConfigLoader::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("database.path", "./data/marquee.db")?
            .set_default("tmdb.api_url", default_tmdb_url())?
            .set_default("tmdb.timeout_secs", default_timeout())?
            .set_default("tmdb.cache_ttl_secs", default_cache_ttl())?;

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let config = builder
            // MARQUEE_SERVER__PORT=9000 -> server.port = 9000
            .add_source(
                Environment::with_prefix("MARQUEE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env)),
            )
            .set_override_option("tmdb.api_token", token)?
            .set_override_option("tmdb.api_url", api_url)?
            .build()?;

        let config: Config = config.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.tmdb.api_url.trim().is_empty() {
            return Err(AppError::Config(config::ConfigError::Message(
                "tmdb.api_url cannot be empty".to_string(),
            )));
        }

        if self.tmdb.api_token.is_none() {
            tracing::warn!("TMDB API token not configured - metadata lookups will fail");
        }

        Ok(())
    }

    /// Get the server socket address
    pub fn server_addr(&self) -> std::net::SocketAddr {
        use std::net::{IpAddr, Ipv4Addr, SocketAddr};
        let ip: IpAddr = self.server.host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid host '{}', using 0.0.0.0", self.server.host);
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        });
        SocketAddr::new(ip, self.server.port)
    }
}
