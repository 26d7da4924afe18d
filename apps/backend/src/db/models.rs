use chrono::{DateTime, Utc};
use serde::Serialize;

/// A movie mirrored from TMDB into the local cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movie {
    pub id: i64,
    pub tmdb_id: i64,
    pub imdb_id: Option<String>,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub genres: Vec<String>,
    pub tagline: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub created_at: String,
}

impl Movie {
    /// Year component of the release date, if known.
    pub fn year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok())
    }

    /// Whether the cached copy is older than `ttl_secs` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl_secs: u64) -> bool {
        let expires = i64::try_from(ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|ttl| self.fetched_at.checked_add_signed(ttl));
        match expires {
            Some(expires) => expires <= now,
            None => false,
        }
    }
}

/// Column values for inserting or refreshing a cached movie.
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub tmdb_id: i64,
    pub imdb_id: Option<String>,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub genres: Vec<String>,
    pub tagline: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn movie(release_date: Option<&str>, fetched_at: DateTime<Utc>) -> Movie {
        Movie {
            id: 1,
            tmdb_id: 550,
            imdb_id: None,
            title: "Fight Club".to_string(),
            original_title: None,
            overview: None,
            release_date: release_date.map(str::to_string),
            poster_path: None,
            backdrop_path: None,
            runtime_minutes: None,
            genres: Vec::new(),
            tagline: None,
            fetched_at,
            created_at: "1999-10-15 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_year_from_release_date() {
        let now = Utc::now();
        assert_eq!(movie(Some("1999-10-15"), now).year(), Some(1999));
        assert_eq!(movie(Some(""), now).year(), None);
        assert_eq!(movie(None, now).year(), None);
    }

    #[test]
    fn test_staleness() {
        let fetched = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let m = movie(None, fetched);

        assert!(!m.is_stale(fetched + chrono::Duration::seconds(59), 60));
        assert!(m.is_stale(fetched + chrono::Duration::seconds(60), 60));
        assert!(!m.is_stale(fetched, u64::MAX));
    }
}
