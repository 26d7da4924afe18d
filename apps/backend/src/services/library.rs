//! The local movie cache and its read-through policy against TMDB.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::db::models::{Movie, NewMovie};
use crate::db::{movies, Session};
use crate::error::{AppError, Result};
use crate::services::tmdb::{TmdbClient, TmdbMovieDetails};

/// Cache operations for one session.
pub struct MovieLibrary<'a> {
    session: &'a Session,
    tmdb: &'a TmdbClient,
    cache_ttl_secs: u64,
}

impl<'a> MovieLibrary<'a> {
    pub fn new(session: &'a Session, tmdb: &'a TmdbClient, cache_ttl_secs: u64) -> Self {
        Self {
            session,
            tmdb,
            cache_ttl_secs,
        }
    }

    pub async fn cached(&self, tmdb_id: i64) -> Result<Option<Movie>> {
        self.session
            .read(|conn| Ok(movies::find_by_tmdb_id(conn, tmdb_id)?))
            .await
    }

    /// Cache a movie. The flag is `true` when it was fetched from TMDB and
    /// `false` when it was already in the cache.
    pub async fn add(&self, tmdb_id: i64) -> Result<(Movie, bool)> {
        if let Some(existing) = self.cached(tmdb_id).await? {
            tracing::debug!(tmdb_id, "Movie already cached");
            return Ok((existing, false));
        }

        let movie = self.fetch_and_store(tmdb_id).await?;
        tracing::info!(
            movie_id = movie.id,
            tmdb_id = movie.tmdb_id,
            title = %movie.title,
            "Movie added"
        );
        Ok((movie, true))
    }

    /// Read-through lookup.
    ///
    /// Fresh rows come from the cache. Missing rows are fetched and stored.
    /// Stale rows are refetched, and served as-is if TMDB cannot be reached.
    pub async fn get(&self, tmdb_id: i64) -> Result<Movie> {
        match self.cached(tmdb_id).await? {
            Some(movie) if !movie.is_stale(Utc::now(), self.cache_ttl_secs) => {
                tracing::debug!(tmdb_id, "Cache hit");
                Ok(movie)
            }
            Some(stale) => match self.fetch_and_store(tmdb_id).await {
                Ok(movie) => {
                    tracing::debug!(tmdb_id, "Refreshed stale cache entry");
                    Ok(movie)
                }
                Err(AppError::Upstream(msg)) => {
                    tracing::warn!(tmdb_id, error = %msg, "Serving stale cache entry");
                    Ok(stale)
                }
                Err(e) => Err(e),
            },
            None => {
                tracing::debug!(tmdb_id, "Cache miss");
                self.fetch_and_store(tmdb_id).await
            }
        }
    }

    /// Refetch a cached movie regardless of its age.
    pub async fn refresh(&self, tmdb_id: i64) -> Result<Movie> {
        if self.cached(tmdb_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Movie {} is not in the library",
                tmdb_id
            )));
        }
        self.fetch_and_store(tmdb_id).await
    }

    pub async fn remove(&self, tmdb_id: i64) -> Result<()> {
        let removed = self
            .session
            .transaction(|tx| Ok(movies::delete(tx, tmdb_id)?))
            .await?;

        if removed == 0 {
            return Err(AppError::NotFound(format!(
                "Movie {} is not in the library",
                tmdb_id
            )));
        }

        tracing::info!(tmdb_id, "Movie removed");
        Ok(())
    }

    /// One page of cached movies plus the total count.
    pub async fn page(&self, limit: u32, offset: u32) -> Result<(Vec<Movie>, u64)> {
        self.session
            .read(|conn| {
                let total = movies::count(conn)?;
                let items = movies::list(conn, limit, offset)?;
                Ok((items, total))
            })
            .await
    }

    pub async fn in_library(&self, tmdb_ids: &[i64]) -> Result<HashSet<i64>> {
        self.session
            .read(|conn| Ok(movies::cached_ids(conn, tmdb_ids)?))
            .await
    }

    async fn fetch_and_store(&self, tmdb_id: i64) -> Result<Movie> {
        let details = self.tmdb.get_movie(tmdb_id).await?;
        let new = new_movie(details, Utc::now());

        self.session
            .transaction(|tx| Ok(movies::upsert(tx, &new)?))
            .await
    }
}

fn new_movie(details: TmdbMovieDetails, fetched_at: DateTime<Utc>) -> NewMovie {
    NewMovie {
        tmdb_id: details.id,
        imdb_id: details.imdb_id.filter(|id| !id.is_empty()),
        title: details.title,
        original_title: details.original_title,
        overview: details.overview,
        release_date: details.release_date.filter(|d| !d.is_empty()),
        poster_path: details.poster_path,
        backdrop_path: details.backdrop_path,
        runtime_minutes: details.runtime,
        genres: details.genres.into_iter().map(|g| g.name).collect(),
        tagline: details.tagline.filter(|t| !t.is_empty()),
        fetched_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_movie_from_details() {
        let details: TmdbMovieDetails = serde_json::from_value(serde_json::json!({
            "id": 115,
            "title": "The Big Lebowski",
            "original_title": "The Big Lebowski",
            "overview": "Jeffrey 'The Dude' Lebowski...",
            "release_date": "1998-03-06",
            "poster_path": "/9mprbw31MGdd66LR0AQKoDMoFRv.jpg",
            "backdrop_path": null,
            "runtime": 117,
            "genres": [{"id": 35, "name": "Comedy"}, {"id": 80, "name": "Crime"}],
            "imdb_id": "tt0118715",
            "tagline": ""
        }))
        .unwrap();

        let fetched_at = Utc::now();
        let movie = new_movie(details, fetched_at);

        assert_eq!(movie.tmdb_id, 115);
        assert_eq!(movie.genres, vec!["Comedy", "Crime"]);
        assert_eq!(movie.runtime_minutes, Some(117));
        assert_eq!(movie.tagline, None);
        assert_eq!(movie.fetched_at, fetched_at);
    }
}
