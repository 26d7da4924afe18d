//! Application services for the Marquee backend.

pub mod images;
pub mod library;
pub mod tmdb;

pub use images::ImageSettings;
pub use library::MovieLibrary;
pub use tmdb::TmdbClient;
