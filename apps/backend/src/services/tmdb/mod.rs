//! TMDB (The Movie Database) service client.
//!
//! Provides methods to search and fetch movie metadata and the image
//! configuration from the TMDB v3 API.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::TmdbConfig;
use crate::error::{AppError, Result};

pub mod transport;

pub use transport::{HttpTransport, Transport, TransportError, UpstreamRequest, UpstreamResponse};

/// TMDB API client for fetching movie metadata.
pub struct TmdbClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    api_token: Option<String>,
}

impl TmdbClient {
    /// Create a client that sends its requests through `transport`.
    ///
    /// Returns an error if the configured base URL is not a valid URL.
    pub fn new(config: &TmdbConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let base_url = config.api_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| AppError::Internal(format!("Invalid TMDB API URL {}: {}", base_url, e)))?;

        let api_token = config
            .api_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(Self {
            transport,
            base_url,
            api_token,
        })
    }

    /// Create a client backed by a real HTTP transport.
    pub fn from_config(config: &TmdbConfig) -> Result<Self> {
        let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs))
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Self::new(config, Arc::new(transport))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.api_token.is_some()
    }

    /// Search for movies by title.
    pub async fn search_movies(
        &self,
        query: &str,
        page: u32,
    ) -> Result<TmdbSearchResponse<TmdbMovie>> {
        tracing::debug!(query = %query, page, "Searching TMDB movies");

        let params = [
            ("query", query.to_string()),
            ("page", page.to_string()),
            ("include_adult", "false".to_string()),
        ];
        self.get_with_params("/search/movie", &params).await
    }

    /// Get detailed information about a specific movie.
    pub async fn get_movie(&self, id: i64) -> Result<TmdbMovieDetails> {
        tracing::debug!(movie_id = %id, "Fetching TMDB movie details");
        self.get_with_params(&format!("/movie/{}", id), &[]).await
    }

    /// Get the API configuration (image base URLs and size variants).
    pub async fn configuration(&self) -> Result<TmdbConfiguration> {
        tracing::debug!("Fetching TMDB configuration");
        self.get_with_params("/configuration", &[]).await
    }

    async fn get_with_params<T>(&self, path: &str, params: &[(&str, String)]) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let token = self
            .api_token
            .as_ref()
            .ok_or_else(|| AppError::Upstream("TMDB API token not configured".to_string()))?;

        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| AppError::Internal(format!("Invalid TMDB URL for {}: {}", path, e)))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        let response = self
            .transport
            .get(UpstreamRequest::new(url).with_bearer_token(token.clone()))
            .await
            .map_err(|e| AppError::Upstream(format!("TMDB request to {} failed: {}", path, e)))?;

        match response.status {
            401 => {
                return Err(AppError::Upstream(
                    "TMDB API token is invalid or missing".to_string(),
                ))
            }
            404 => {
                let detail = serde_json::from_str::<TmdbStatus>(&response.body)
                    .map(|s| s.status_message)
                    .unwrap_or_else(|_| "resource not found".to_string());
                return Err(AppError::NotFound(format!("TMDB {}: {}", path, detail)));
            }
            429 => {
                return Err(AppError::Upstream(
                    "TMDB rate limit exceeded, please try again later".to_string(),
                ))
            }
            _ if !response.is_success() => {
                return Err(AppError::Upstream(format!(
                    "TMDB API {} returned error status: {}",
                    path, response.status
                )))
            }
            _ => {}
        }

        serde_json::from_str::<T>(&response.body).map_err(|e| {
            AppError::Internal(format!(
                "Failed to parse TMDB response from {}: {}",
                path, e
            ))
        })
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Generic search response wrapper from TMDB API.
#[derive(Debug, Deserialize)]
pub struct TmdbSearchResponse<T> {
    pub results: Vec<T>,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

fn first_page() -> u32 {
    1
}

/// Movie search result from TMDB.
#[derive(Debug, Deserialize)]
pub struct TmdbMovie {
    pub id: i64,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

/// Detailed movie information from TMDB.
#[derive(Debug, Deserialize)]
pub struct TmdbMovieDetails {
    pub id: i64,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub runtime: Option<i32>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    pub imdb_id: Option<String>,
    pub tagline: Option<String>,
}

/// Genre information from TMDB.
#[derive(Debug, Deserialize)]
pub struct TmdbGenre {
    pub id: i64,
    pub name: String,
}

/// Body of `/configuration`.
#[derive(Debug, Deserialize)]
pub struct TmdbConfiguration {
    pub images: ImageConfiguration,
}

/// Where images live and which size variants exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfiguration {
    pub base_url: String,
    pub secure_base_url: String,
    #[serde(default)]
    pub backdrop_sizes: Vec<String>,
    #[serde(default)]
    pub logo_sizes: Vec<String>,
    #[serde(default)]
    pub poster_sizes: Vec<String>,
    #[serde(default)]
    pub profile_sizes: Vec<String>,
    #[serde(default)]
    pub still_sizes: Vec<String>,
}

impl ImageConfiguration {
    /// Generate a poster URL for the given path and size.
    ///
    /// Returns `None` when `size` is not one of the advertised poster sizes.
    pub fn poster_url(&self, path: &str, size: &str) -> Option<String> {
        if !self.poster_sizes.iter().any(|s| s == size) {
            return None;
        }
        Some(format!(
            "{}/{}/{}",
            self.secure_base_url.trim_end_matches('/'),
            size,
            path.trim_start_matches('/')
        ))
    }
}

/// Status body TMDB returns alongside error codes.
#[derive(Debug, Deserialize)]
pub struct TmdbStatus {
    pub status_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers every request with one canned response and remembers the URLs.
    struct CannedTransport {
        response: UpstreamResponse,
        seen: Mutex<Vec<UpstreamRequest>>,
    }

    impl CannedTransport {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: UpstreamResponse::new(status, body),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn get(
            &self,
            request: UpstreamRequest,
        ) -> std::result::Result<UpstreamResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    fn config(token: Option<&str>) -> TmdbConfig {
        TmdbConfig {
            api_url: "http://tmdb.test/3/".to_string(),
            api_token: token.map(str::to_string),
            ..TmdbConfig::default()
        }
    }

    fn images() -> ImageConfiguration {
        ImageConfiguration {
            base_url: "http://image.tmdb.org/t/p/".to_string(),
            secure_base_url: "https://image.tmdb.org/t/p/".to_string(),
            backdrop_sizes: vec![],
            logo_sizes: vec![],
            poster_sizes: vec!["w500".to_string(), "original".to_string()],
            profile_sizes: vec![],
            still_sizes: vec![],
        }
    }

    #[test]
    fn test_poster_url() {
        let url = images().poster_url("/abc123.jpg", "w500");
        assert_eq!(url.as_deref(), Some("https://image.tmdb.org/t/p/w500/abc123.jpg"));
    }

    #[test]
    fn test_poster_url_rejects_unknown_size() {
        assert_eq!(images().poster_url("/abc123.jpg", "w9999"), None);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = TmdbConfig {
            api_url: "not a url".to_string(),
            ..TmdbConfig::default()
        };
        let transport = CannedTransport::new(200, "{}");
        assert!(TmdbClient::new(&config, transport).is_err());
    }

    #[tokio::test]
    async fn test_missing_token_fails_without_calling_upstream() {
        let transport = CannedTransport::new(200, "{}");
        let client = TmdbClient::new(&config(Some("   ")), transport.clone()).unwrap();

        let err = client.get_movie(550).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_builds_url_and_sends_token() {
        let transport = CannedTransport::new(
            200,
            r#"{"page":1,"results":[{"id":550,"title":"Fight Club","genre_ids":[18]}],"total_pages":1,"total_results":1}"#,
        );
        let client = TmdbClient::new(&config(Some("TESTING")), transport.clone()).unwrap();

        let response = client.search_movies("fight club", 1).await.unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].genre_ids, vec![18]);

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].url_without_query(), "http://tmdb.test/3/search/movie");
        assert_eq!(seen[0].query_param("query").as_deref(), Some("fight club"));
        assert_eq!(seen[0].bearer_token.as_deref(), Some("TESTING"));
    }

    #[tokio::test]
    async fn test_not_found_carries_status_message() {
        let transport = CannedTransport::new(
            404,
            r#"{"success":false,"status_code":34,"status_message":"The resource you requested could not be found."}"#,
        );
        let client = TmdbClient::new(&config(Some("TESTING")), transport).unwrap();

        match client.get_movie(1).await {
            Err(AppError::NotFound(msg)) => {
                assert!(msg.contains("could not be found"), "unexpected message: {}", msg)
            }
            other => panic!("expected NotFound, got {:?}", other.map(|m| m.id)),
        }
    }

    #[tokio::test]
    async fn test_details_ignore_fields_not_cached() {
        let transport = CannedTransport::new(
            200,
            r#"{"id":550,"title":"Fight Club","vote_average":8.4,"status":"Released","budget":63000000,"genres":[{"id":18,"name":"Drama"}],"runtime":139}"#,
        );
        let client = TmdbClient::new(&config(Some("TESTING")), transport).unwrap();

        let details = client.get_movie(550).await.unwrap();
        assert_eq!(details.title, "Fight Club");
        assert_eq!(details.runtime, Some(139));
        assert_eq!(details.genres[0].name, "Drama");
    }

    #[tokio::test]
    async fn test_configuration_ignores_change_keys() {
        let transport = CannedTransport::new(
            200,
            r#"{"images":{"base_url":"http://image.tmdb.org/t/p/","secure_base_url":"https://image.tmdb.org/t/p/","poster_sizes":["original"]},"change_keys":["adult","title"]}"#,
        );
        let client = TmdbClient::new(&config(Some("TESTING")), transport).unwrap();

        let configuration = client.configuration().await.unwrap();
        assert_eq!(configuration.images.poster_sizes, vec!["original"]);
    }

    #[tokio::test]
    async fn test_error_statuses_map_to_upstream() {
        for status in [401, 429, 500, 503] {
            let transport = CannedTransport::new(status, "");
            let client = TmdbClient::new(&config(Some("TESTING")), transport).unwrap();
            let err = client.configuration().await.unwrap_err();
            assert!(matches!(err, AppError::Upstream(_)), "status {}", status);
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_internal() {
        let transport = CannedTransport::new(200, "not json");
        let client = TmdbClient::new(&config(Some("TESTING")), transport).unwrap();
        let err = client.configuration().await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
