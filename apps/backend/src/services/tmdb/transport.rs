//! Outbound HTTP boundary for TMDB calls.
//!
//! `TmdbClient` never talks to reqwest directly; it hands an
//! [`UpstreamRequest`] to a [`Transport`]. Production uses [`HttpTransport`],
//! tests install a transport that answers from a route table.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no upstream route for {0}")]
    Unrouted(String),
}

/// A GET request bound for the upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub url: Url,
    pub bearer_token: Option<String>,
}

impl UpstreamRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            bearer_token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// The URL with its query string and fragment removed.
    pub fn url_without_query(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.to_string()
    }

    /// First value of query parameter `name`.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}

/// Status and raw body of an upstream reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError>;
}

/// Transport backed by a real reqwest client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        let url = request.url.to_string();
        let mut builder = self.client.get(request.url);
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let wrap = |source| TransportError::Request {
            url: url.clone(),
            source,
        };

        let response = builder.send().await.map_err(wrap)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(wrap)?;

        Ok(UpstreamResponse { status, body })
    }
}
