//! In-process stand-in for the TMDB HTTP API.
//!
//! [`MockTransport`] implements the backend's [`Transport`] seam with a route
//! table, so TMDB calls made by handlers never leave the test process.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Url;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use marquee::services::tmdb::{Transport, TransportError, UpstreamRequest, UpstreamResponse};

use crate::error::TestError;

enum Matcher {
    /// Full URL without query string.
    Exact(String),
    Pattern(Regex),
}

struct Route {
    name: String,
    matcher: Matcher,
    response: UpstreamResponse,
    hits: AtomicUsize,
}

/// Route table answering upstream requests under one base URL.
///
/// Lookup order for a request:
/// 1. Anything outside `base_url` is refused.
/// 2. Exact-path routes, most recently registered first.
/// 3. Pattern routes, in registration order.
///
/// Routes are allowed to go uncalled. Requests that match nothing are
/// recorded and fail with [`TransportError::Unrouted`].
pub struct MockTransport {
    base_url: String,
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<String>>,
    unmatched: Mutex<Vec<String>>,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// `base_url` is normalized the way request URLs are, so scheme and host
    /// case or a trailing slash do not affect matching.
    pub fn new(base_url: impl Into<String>) -> Self {
        let raw = base_url.into();
        let normalized = Url::parse(&raw)
            .map(|url| url.to_string())
            .unwrap_or(raw);

        Self {
            base_url: normalized.trim_end_matches('/').to_string(),
            routes: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            unmatched: Mutex::new(Vec::new()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Answer `GET {base_url}{path}` (any query string) with `response`.
    pub fn route_path(&self, name: &str, path: &str, response: UpstreamResponse) -> &Self {
        let url = format!("{}{}", self.base_url, path);
        self.push(name, Matcher::Exact(url), response)
    }

    /// Answer any request whose URL, without query string, matches `pattern`.
    pub fn route_regex(
        &self,
        name: &str,
        pattern: &str,
        response: UpstreamResponse,
    ) -> Result<&Self, TestError> {
        let regex = Regex::new(pattern)?;
        Ok(self.push(name, Matcher::Pattern(regex), response))
    }

    fn push(&self, name: &str, matcher: Matcher, response: UpstreamResponse) -> &Self {
        guard(&self.routes).push(Route {
            name: name.to_string(),
            matcher,
            response,
            hits: AtomicUsize::new(0),
        });
        self
    }

    /// How many requests routes named `name` have answered.
    pub fn hits(&self, name: &str) -> usize {
        guard(&self.routes)
            .iter()
            .filter(|route| route.name == name)
            .map(|route| route.hits.load(Ordering::SeqCst))
            .sum()
    }

    /// Every request URL seen, query string included, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        guard(&self.requests).clone()
    }

    /// Request URLs no route answered.
    pub fn unmatched(&self) -> Vec<String> {
        guard(&self.unmatched).clone()
    }

    /// Whether `url` lies under the base path, on a segment boundary.
    fn in_namespace(&self, url: &str) -> bool {
        match url.strip_prefix(&self.base_url) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    fn respond(&self, url: &str) -> Option<UpstreamResponse> {
        let routes = guard(&self.routes);

        let exact = routes
            .iter()
            .rev()
            .find(|route| matches!(&route.matcher, Matcher::Exact(u) if u == url));
        let route = exact.or_else(|| {
            routes
                .iter()
                .find(|route| matches!(&route.matcher, Matcher::Pattern(re) if re.is_match(url)))
        })?;

        route.hits.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(route = %route.name, url, status = route.response.status, "Mock upstream hit");
        Some(route.response.clone())
    }

    fn reject(&self, url: String, reason: &str) -> TransportError {
        tracing::error!(url = %url, reason, "Unmocked upstream request");
        guard(&self.unmatched).push(url.clone());
        TransportError::Unrouted(url)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        guard(&self.requests).push(request.url.to_string());
        let url = request.url_without_query();

        if !self.in_namespace(&url) {
            return Err(self.reject(url, "outside mocked base URL"));
        }

        self.respond(&url)
            .ok_or_else(|| self.reject(url, "no matching route"))
    }
}
