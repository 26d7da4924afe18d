//! Search API endpoint proxying TMDB movie search.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::DbSession;
use crate::error::{AppError, Result};
use crate::services::MovieLibrary;
use crate::AppState;

/// Query parameters for TMDB movie search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string.
    pub query: String,
    /// Page number (1-indexed, default: 1).
    pub page: Option<u32>,
}

/// TMDB movie search result.
#[derive(Debug, Serialize)]
pub struct MovieResult {
    pub tmdb_id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    pub genre_ids: Vec<i64>,
    /// Whether the movie is already in the local cache.
    pub in_library: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u32,
    pub results: Vec<MovieResult>,
}

/// GET /api/search
pub async fn search_movies(
    State(state): State<AppState>,
    DbSession(session): DbSession,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    let term = query.query.trim();
    if term.is_empty() {
        return Err(AppError::BadRequest(
            "Search query cannot be empty".to_string(),
        ));
    }
    let page = query.page.unwrap_or(1).clamp(1, 500);

    let response = state.tmdb().search_movies(term, page).await?;

    let ids: Vec<i64> = response.results.iter().map(|m| m.id).collect();
    let library = MovieLibrary::new(&session, state.tmdb(), state.config.tmdb.cache_ttl_secs);
    let cached = library.in_library(&ids).await?;

    let results = response
        .results
        .into_iter()
        .map(|m| MovieResult {
            in_library: cached.contains(&m.id),
            tmdb_id: m.id,
            title: m.title,
            overview: m.overview,
            release_date: m.release_date.filter(|d| !d.is_empty()),
            poster_path: m.poster_path,
            genre_ids: m.genre_ids,
        })
        .collect::<Vec<_>>();

    tracing::debug!(query = %term, page, results = results.len(), "TMDB search complete");

    Ok(Json(SearchResponse {
        page: response.page,
        total_pages: response.total_pages,
        total_results: response.total_results,
        results,
    }))
}
