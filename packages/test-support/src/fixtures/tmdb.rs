//! Mock profiles for the TMDB endpoints the backend calls.
//!
//! Each profile registers its routes on a [`MockTransport`]; profiles can be
//! combined freely on the same transport.

use serde_json::{json, Value};
use std::path::Path;

use marquee::services::tmdb::UpstreamResponse;

use super::generate::{fake_movies, FakeMovie};
use crate::error::TestError;
use crate::upstream::MockTransport;

pub const SEARCH_ROUTE: &str = "search_tmdb_movies";
pub const CONFIGURATION_ROUTE: &str = "tmdb_configuration";
pub const MOVIE_NOT_FOUND_ROUTE: &str = "tmdb_movie_not_found";

/// Movies with canned detail payloads under `test_data/`.
pub const CANNED_MOVIE_IDS: [i64; 3] = [115, 550, 6978];

pub const SEARCH_RESULT_COUNT: usize = 10;

/// Route name of the canned details for `tmdb_id`.
pub fn movie_route(tmdb_id: i64) -> String {
    format!("tmdb_movie_{}", tmdb_id)
}

/// `GET /search/movie` answers with ten freshly generated movies.
///
/// Returns the generated results so tests can compare against them.
pub fn mock_search(upstream: &MockTransport) -> Vec<FakeMovie> {
    let results = fake_movies(SEARCH_RESULT_COUNT);
    let body = json!({
        "page": 1,
        "results": results,
        "total_pages": 1,
        "total_results": results.len(),
    });

    upstream.route_path(SEARCH_ROUTE, "/search/movie", UpstreamResponse::json(200, &body));
    results
}

/// The image configuration TMDB advertised when the fixtures were captured.
pub fn configuration_body() -> Value {
    json!({
        "images": {
            "base_url": "http://image.tmdb.org/t/p/",
            "secure_base_url": "https://image.tmdb.org/t/p/",
            "backdrop_sizes": ["w300", "w780", "w1280", "original"],
            "logo_sizes": ["w45", "w92", "w154", "w185", "w300", "w500", "original"],
            "poster_sizes": ["w92", "w154", "w185", "w342", "w500", "w780", "original"],
            "profile_sizes": ["w45", "w185", "h632", "original"],
            "still_sizes": ["w92", "w185", "w300", "original"]
        }
    })
}

/// `GET /configuration` answers with [`configuration_body`].
pub fn mock_configuration(upstream: &MockTransport) {
    upstream.route_path(
        CONFIGURATION_ROUTE,
        "/configuration",
        UpstreamResponse::json(200, &configuration_body()),
    );
}

/// TMDB's body for an unknown resource.
pub fn not_found_body() -> Value {
    json!({
        "success": false,
        "status_code": 34,
        "status_message": "The resource you requested could not be found.",
    })
}

/// Read `{dir}/{tmdb_id}.json`.
pub fn load_movie_details(dir: &Path, tmdb_id: i64) -> Result<Value, TestError> {
    let path = dir.join(format!("{}.json", tmdb_id));
    let raw = std::fs::read_to_string(&path)
        .map_err(|source| TestError::FixtureData { path, source })?;
    Ok(serde_json::from_str(&raw)?)
}

/// `GET /movie/{id}` answers with the canned details for
/// [`CANNED_MOVIE_IDS`] and with TMDB's 404 body for every other id.
///
/// Fails before registering anything if a data file is missing.
pub fn mock_movie_details(upstream: &MockTransport, dir: &Path) -> Result<(), TestError> {
    let movies = CANNED_MOVIE_IDS
        .iter()
        .map(|&id| load_movie_details(dir, id).map(|body| (id, body)))
        .collect::<Result<Vec<_>, _>>()?;

    for (id, body) in movies {
        upstream.route_path(
            &movie_route(id),
            &format!("/movie/{}", id),
            UpstreamResponse::json(200, &body),
        );
    }

    let fallback = format!("^{}/movie/", regex::escape(upstream.base_url()));
    upstream.route_regex(
        MOVIE_NOT_FOUND_ROUTE,
        &fallback,
        UpstreamResponse::json(404, &not_found_body()),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::TEST_TMDB_API_URL;
    use crate::fixtures::test_data_dir;

    #[test]
    fn test_canned_details_parse() {
        for id in CANNED_MOVIE_IDS {
            let body = load_movie_details(&test_data_dir(), id).unwrap();
            assert_eq!(body["id"], id);
            assert!(body["title"].is_string());
        }
    }

    #[test]
    fn test_missing_fixture_names_path() {
        let upstream = MockTransport::new(TEST_TMDB_API_URL);
        let dir = test_data_dir().join("does-not-exist");

        let err = mock_movie_details(&upstream, &dir).unwrap_err();

        match err {
            TestError::FixtureData { path, .. } => assert!(path.ends_with("115.json")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(upstream.hits(MOVIE_NOT_FOUND_ROUTE), 0);
    }

    #[test]
    fn test_configuration_poster_sizes() {
        let body = configuration_body();
        let sizes: Vec<&str> = body["images"]["poster_sizes"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(sizes, ["w92", "w154", "w185", "w342", "w500", "w780", "original"]);
    }
}
