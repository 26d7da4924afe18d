//! Random movie records shaped like TMDB search results.
//!
//! Every call draws from a fresh `thread_rng`, so two tests never see the
//! same data. Don't assert on specific values, only on shape.

use chrono::{Duration, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

const WORDS: &[&str] = &[
    "night", "city", "river", "stranger", "return", "last", "summer", "shadow", "empire",
    "dream", "house", "storm", "silent", "golden", "road", "winter", "machine", "heart",
    "island", "secret", "fire", "broken", "garden", "echo", "midnight", "wild", "glass",
    "kingdom", "ghost", "paper", "signal", "north", "harbor", "velvet", "iron", "moon",
    "distant", "promise", "mirror", "thunder",
];

const MAX_TITLE_CHARS: usize = 50;
const OVERVIEW_WORDS: usize = 30;
const POSTER_LETTERS: usize = 27;
const GENRES_PER_MOVIE: usize = 3;

/// One entry of a TMDB `/search/movie` result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeMovie {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub release_date: String,
    pub poster_path: String,
    pub genre_ids: Vec<i64>,
}

pub fn fake_movies(count: usize) -> Vec<FakeMovie> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| fake_movie(&mut rng)).collect()
}

fn fake_movie<R: Rng>(rng: &mut R) -> FakeMovie {
    FakeMovie {
        id: rng.gen_range(1..10_000),
        title: title(rng),
        overview: sentence(rng, OVERVIEW_WORDS),
        release_date: release_date(rng),
        poster_path: poster_path(rng),
        genre_ids: (0..GENRES_PER_MOVIE)
            .map(|_| rng.gen_range(1..10_000))
            .collect(),
    }
}

fn words<R: Rng>(rng: &mut R, count: usize) -> Vec<&'static str> {
    (0..count)
        .filter_map(|_| WORDS.choose(rng).copied())
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn title<R: Rng>(rng: &mut R) -> String {
    let count = rng.gen_range(1..=6);
    let mut title = String::new();
    for word in words(rng, count) {
        let word = capitalize(word);
        let extra = if title.is_empty() { 0 } else { 1 };
        if title.len() + extra + word.len() > MAX_TITLE_CHARS {
            break;
        }
        if extra == 1 {
            title.push(' ');
        }
        title.push_str(&word);
    }
    title
}

fn sentence<R: Rng>(rng: &mut R, count: usize) -> String {
    let body = words(rng, count).join(" ");
    format!("{}.", capitalize(&body))
}

fn release_date<R: Rng>(rng: &mut R) -> String {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    let span = (Utc::now().date_naive() - epoch).num_days().max(1);
    let date = epoch + Duration::days(rng.gen_range(0..span));
    date.format("%Y-%m-%d").to_string()
}

fn poster_path<R: Rng>(rng: &mut R) -> String {
    let letters: String = (0..POSTER_LETTERS)
        .map(|_| {
            let base = if rng.gen_bool(0.5) { b'a' } else { b'A' };
            char::from(base + rng.gen_range(0..26u8))
        })
        .collect();
    format!("/{}.jpg", letters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_movies_have_expected_shape() {
        let movies = fake_movies(25);
        assert_eq!(movies.len(), 25);

        for movie in &movies {
            assert!(!movie.title.is_empty());
            assert!(movie.title.len() <= MAX_TITLE_CHARS);
            assert_eq!(movie.overview.split_whitespace().count(), OVERVIEW_WORDS);
            assert!(movie.overview.ends_with('.'));
            assert!(NaiveDate::parse_from_str(&movie.release_date, "%Y-%m-%d").is_ok());
            assert_eq!(movie.genre_ids.len(), GENRES_PER_MOVIE);

            let stem = movie
                .poster_path
                .strip_prefix('/')
                .and_then(|p| p.strip_suffix(".jpg"))
                .unwrap();
            assert_eq!(stem.len(), POSTER_LETTERS);
            assert!(stem.chars().all(|c| c.is_ascii_alphabetic()));
        }
    }

    #[test]
    fn test_consecutive_draws_differ() {
        assert_ne!(fake_movies(10), fake_movies(10));
    }

    #[test]
    fn test_serializes_like_tmdb_result() {
        let movie = fake_movies(1).remove(0);
        let value = serde_json::to_value(&movie).unwrap();
        for key in ["id", "title", "overview", "release_date", "poster_path", "genre_ids"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
    }
}
