//! Movies API endpoints for the local TMDB cache.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::models::Movie;
use crate::db::DbSession;
use crate::error::{AppError, Result};
use crate::services::MovieLibrary;
use crate::AppState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Query parameters for listing movies.
#[derive(Debug, Deserialize)]
pub struct ListMoviesQuery {
    /// Page number (1-indexed, default: 1).
    pub page: Option<u32>,
    /// Items per page (default: 20, max: 100).
    pub limit: Option<u32>,
}

/// Paginated response wrapper.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub pages: u32,
}

/// Request body for adding a movie.
#[derive(Debug, Deserialize)]
pub struct AddMovieRequest {
    pub tmdb_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct PosterQuery {
    /// One of the advertised poster sizes (default: "original").
    pub size: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PosterResponse {
    pub tmdb_id: i64,
    pub size: String,
    pub url: String,
}

fn library<'a>(state: &'a AppState, session: &'a crate::db::Session) -> MovieLibrary<'a> {
    MovieLibrary::new(session, state.tmdb(), state.config.tmdb.cache_ttl_secs)
}

fn validate_tmdb_id(tmdb_id: i64) -> Result<()> {
    if tmdb_id <= 0 {
        return Err(AppError::BadRequest("Invalid TMDB ID".to_string()));
    }
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/movies
///
/// Lists cached movies, newest first.
pub async fn list_movies(
    State(state): State<AppState>,
    DbSession(session): DbSession,
    Query(query): Query<ListMoviesQuery>,
) -> Result<Json<PaginatedResponse<Movie>>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1).saturating_mul(limit);

    let (items, total) = library(&state, &session).page(limit, offset).await?;
    let pages = total.div_ceil(u64::from(limit)) as u32;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page,
        pages,
    }))
}

/// POST /api/movies
///
/// Caches a movie by TMDB ID. Responds 201 when it was fetched from TMDB and
/// 200 when it was already cached.
pub async fn add_movie(
    State(state): State<AppState>,
    DbSession(session): DbSession,
    Json(body): Json<AddMovieRequest>,
) -> Result<(StatusCode, Json<Movie>)> {
    validate_tmdb_id(body.tmdb_id)?;

    let (movie, created) = library(&state, &session).add(body.tmdb_id).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(movie)))
}

/// GET /api/movies/:tmdb_id
pub async fn get_movie(
    State(state): State<AppState>,
    DbSession(session): DbSession,
    Path(tmdb_id): Path<i64>,
) -> Result<Json<Movie>> {
    validate_tmdb_id(tmdb_id)?;
    let movie = library(&state, &session).get(tmdb_id).await?;
    Ok(Json(movie))
}

/// POST /api/movies/:tmdb_id/refresh
pub async fn refresh_movie(
    State(state): State<AppState>,
    DbSession(session): DbSession,
    Path(tmdb_id): Path<i64>,
) -> Result<Json<Movie>> {
    let movie = library(&state, &session).refresh(tmdb_id).await?;
    tracing::info!(tmdb_id, title = %movie.title, "Movie metadata refreshed");
    Ok(Json(movie))
}

/// DELETE /api/movies/:tmdb_id
pub async fn delete_movie(
    State(state): State<AppState>,
    DbSession(session): DbSession,
    Path(tmdb_id): Path<i64>,
) -> Result<StatusCode> {
    library(&state, &session).remove(tmdb_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/movies/:tmdb_id/poster
///
/// Resolves the full poster URL from TMDB's image configuration.
pub async fn get_poster(
    State(state): State<AppState>,
    DbSession(session): DbSession,
    Path(tmdb_id): Path<i64>,
    Query(query): Query<PosterQuery>,
) -> Result<Json<PosterResponse>> {
    validate_tmdb_id(tmdb_id)?;
    let movie = library(&state, &session).get(tmdb_id).await?;

    let poster_path = movie
        .poster_path
        .ok_or_else(|| AppError::NotFound(format!("Movie {} has no poster", tmdb_id)))?;

    let size = query.size.unwrap_or_else(|| "original".to_string());
    let images = state.images.get(state.tmdb()).await?;
    let url = images.poster_url(&poster_path, &size).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Unknown poster size '{}', expected one of: {}",
            size,
            images.poster_sizes.join(", ")
        ))
    })?;

    Ok(Json(PosterResponse { tmdb_id, size, url }))
}
