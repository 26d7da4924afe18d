//! Environment overlay for configuration loading.
//!
//! Tests never call `std::env::set_var`. Instead each test builds an
//! [`EnvOverlay`] and hands it to [`marquee::config::Config::load_with_env`],
//! so parallel tests cannot observe each other's variables.

use std::collections::HashMap;

use marquee::config::{Config, TMDB_API_TOKEN_VAR, TMDB_API_URL_VAR};

use crate::constant::{TEST_TMDB_API_TOKEN, TEST_TMDB_API_URL};
use crate::error::TestError;

/// A private set of environment variables for one test.
#[derive(Debug, Clone)]
pub struct EnvOverlay {
    vars: HashMap<String, String>,
}

impl Default for EnvOverlay {
    /// The test environment: placeholder TMDB token and the mock base URL.
    fn default() -> Self {
        Self::empty()
            .set(TMDB_API_TOKEN_VAR, TEST_TMDB_API_TOKEN)
            .set(TMDB_API_URL_VAR, TEST_TMDB_API_URL)
    }
}

impl EnvOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// An overlay with no variables at all.
    pub fn empty() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn remove(mut self, key: &str) -> Self {
        self.vars.remove(key);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Load application configuration from this overlay alone.
    ///
    /// No config file is read, so a developer's local `config.toml` cannot
    /// leak into tests.
    pub fn load_config(&self) -> Result<Config, TestError> {
        let env = self
            .vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Config::load_with_env(None, env)?)
    }
}
