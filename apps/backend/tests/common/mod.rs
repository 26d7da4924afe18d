//! Shared helpers for Marquee backend integration tests.
//!
//! The isolation itself (environment, database, session, mocked TMDB) comes
//! from `marquee_test_support`; this module only adds row helpers.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};

use marquee::db::models::{Movie, NewMovie};
use marquee::db::{movies, Session};

/// A cache row as if fetched from TMDB at `fetched_at`.
pub fn new_movie(tmdb_id: i64, title: &str, fetched_at: DateTime<Utc>) -> NewMovie {
    NewMovie {
        tmdb_id,
        imdb_id: None,
        title: title.to_string(),
        original_title: Some(title.to_string()),
        overview: Some(format!("Overview of {}", title)),
        release_date: Some("2001-01-01".to_string()),
        poster_path: Some(format!("/poster{}.jpg", tmdb_id)),
        backdrop_path: None,
        runtime_minutes: Some(100),
        genres: vec!["Drama".to_string()],
        tagline: None,
        fetched_at,
    }
}

/// Write a movie through the test's session.
pub async fn insert_movie(session: &Session, movie: NewMovie) -> Movie {
    session
        .transaction(|tx| Ok(movies::upsert(tx, &movie)?))
        .await
        .expect("Failed to insert movie")
}

/// Write a movie whose cache entry expired long ago.
pub async fn insert_stale_movie(session: &Session, tmdb_id: i64, title: &str) -> Movie {
    let fetched_at = Utc::now() - Duration::days(365 * 10);
    insert_movie(session, new_movie(tmdb_id, title, fetched_at)).await
}

pub async fn find_movie(session: &Session, tmdb_id: i64) -> Option<Movie> {
    session
        .read(|conn| Ok(movies::find_by_tmdb_id(conn, tmdb_id)?))
        .await
        .expect("Failed to read movie")
}

pub async fn movie_count(session: &Session) -> u64 {
    session
        .read(|conn| Ok(movies::count(conn)?))
        .await
        .expect("Failed to count movies")
}
