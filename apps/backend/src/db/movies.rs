//! Queries over the `movies` cache table.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, types::Type, Connection, OptionalExtension, Row};
use std::collections::HashSet;

use super::models::{Movie, NewMovie};

const MOVIE_COLUMNS: &str = "id, tmdb_id, imdb_id, title, original_title, overview, release_date, \
     poster_path, backdrop_path, runtime_minutes, genres, tagline, fetched_at, created_at";

fn map_movie_row(row: &Row<'_>) -> rusqlite::Result<Movie> {
    let genres: String = row.get(10)?;
    let fetched_at: String = row.get(12)?;

    Ok(Movie {
        id: row.get(0)?,
        tmdb_id: row.get(1)?,
        imdb_id: row.get(2)?,
        title: row.get(3)?,
        original_title: row.get(4)?,
        overview: row.get(5)?,
        release_date: row.get(6)?,
        poster_path: row.get(7)?,
        backdrop_path: row.get(8)?,
        runtime_minutes: row.get(9)?,
        genres: serde_json::from_str(&genres).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e))
        })?,
        tagline: row.get(11)?,
        fetched_at: DateTime::parse_from_rfc3339(&fetched_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(12, Type::Text, Box::new(e)))?,
        created_at: row.get(13)?,
    })
}

pub fn find_by_tmdb_id(conn: &Connection, tmdb_id: i64) -> rusqlite::Result<Option<Movie>> {
    conn.query_row(
        &format!("SELECT {} FROM movies WHERE tmdb_id = ?1", MOVIE_COLUMNS),
        [tmdb_id],
        map_movie_row,
    )
    .optional()
}

/// Insert a movie, or overwrite the cached copy with the same `tmdb_id`.
pub fn upsert(conn: &Connection, movie: &NewMovie) -> rusqlite::Result<Movie> {
    let genres = serde_json::to_string(&movie.genres)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        r#"
        INSERT INTO movies (
            tmdb_id, imdb_id, title, original_title, overview, release_date,
            poster_path, backdrop_path, runtime_minutes, genres, tagline, fetched_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(tmdb_id) DO UPDATE SET
            imdb_id = excluded.imdb_id,
            title = excluded.title,
            original_title = excluded.original_title,
            overview = excluded.overview,
            release_date = excluded.release_date,
            poster_path = excluded.poster_path,
            backdrop_path = excluded.backdrop_path,
            runtime_minutes = excluded.runtime_minutes,
            genres = excluded.genres,
            tagline = excluded.tagline,
            fetched_at = excluded.fetched_at
        "#,
        params![
            movie.tmdb_id,
            movie.imdb_id,
            movie.title,
            movie.original_title,
            movie.overview,
            movie.release_date,
            movie.poster_path,
            movie.backdrop_path,
            movie.runtime_minutes,
            genres,
            movie.tagline,
            movie.fetched_at.to_rfc3339(),
        ],
    )?;

    find_by_tmdb_id(conn, movie.tmdb_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn count(conn: &Connection) -> rusqlite::Result<u64> {
    conn.query_row("SELECT COUNT(*) FROM movies", [], |row| row.get(0))
}

/// Page through cached movies, newest first.
pub fn list(conn: &Connection, limit: u32, offset: u32) -> rusqlite::Result<Vec<Movie>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM movies ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        MOVIE_COLUMNS
    ))?;

    let movies = stmt
        .query_map(params![limit, offset], map_movie_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(movies)
}

/// Returns the number of rows removed (0 or 1).
pub fn delete(conn: &Connection, tmdb_id: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM movies WHERE tmdb_id = ?1", [tmdb_id])
}

/// The subset of `tmdb_ids` present in the cache.
pub fn cached_ids(conn: &Connection, tmdb_ids: &[i64]) -> rusqlite::Result<HashSet<i64>> {
    if tmdb_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let placeholders = vec!["?"; tmdb_ids.len()].join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT tmdb_id FROM movies WHERE tmdb_id IN ({})",
        placeholders
    ))?;

    let ids = stmt
        .query_map(params_from_iter(tmdb_ids.iter()), |row| row.get(0))?
        .collect::<rusqlite::Result<HashSet<i64>>>()?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn migrated() -> Database {
        let db = Database::in_memory().unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn new_movie(tmdb_id: i64, title: &str) -> NewMovie {
        NewMovie {
            tmdb_id,
            imdb_id: Some("tt0137523".to_string()),
            title: title.to_string(),
            original_title: Some(title.to_string()),
            overview: Some("An insomniac office worker...".to_string()),
            release_date: Some("1999-10-15".to_string()),
            poster_path: Some("/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg".to_string()),
            backdrop_path: None,
            runtime_minutes: Some(139),
            genres: vec!["Drama".to_string()],
            tagline: None,
            fetched_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let db = migrated().await;
        let conn = db.lock().await;

        let first = upsert(&conn, &new_movie(550, "Fight Club")).unwrap();
        assert_eq!(first.tmdb_id, 550);
        assert_eq!(first.genres, vec!["Drama".to_string()]);

        let second = upsert(&conn, &new_movie(550, "Fight Club (Remastered)")).unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.title, "Fight Club (Remastered)");
        assert_eq!(count(&conn).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let db = migrated().await;
        let conn = db.lock().await;
        assert!(find_by_tmdb_id(&conn, 42).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let db = migrated().await;
        let conn = db.lock().await;
        for id in 1..=5 {
            upsert(&conn, &new_movie(id, &format!("Movie {}", id))).unwrap();
        }

        assert_eq!(list(&conn, 2, 0).unwrap().len(), 2);
        assert_eq!(list(&conn, 10, 4).unwrap().len(), 1);

        assert_eq!(delete(&conn, 3).unwrap(), 1);
        assert_eq!(delete(&conn, 3).unwrap(), 0);
        assert_eq!(count(&conn).unwrap(), 4);
    }

    #[tokio::test]
    async fn test_cached_ids() {
        let db = migrated().await;
        let conn = db.lock().await;
        upsert(&conn, &new_movie(115, "The Big Lebowski")).unwrap();
        upsert(&conn, &new_movie(550, "Fight Club")).unwrap();

        let ids = cached_ids(&conn, &[115, 6978, 550]).unwrap();
        assert_eq!(ids, HashSet::from([115, 550]));
        assert!(cached_ids(&conn, &[]).unwrap().is_empty());
    }
}
