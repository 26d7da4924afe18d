//! API endpoint handlers for the Marquee backend.

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod configuration;
pub mod movies;
pub mod search;

/// Build the complete application router.
pub fn router(state: AppState) -> Router {
    let movies_routes = Router::new()
        .route("/", get(movies::list_movies).post(movies::add_movie))
        .route(
            "/:tmdb_id",
            get(movies::get_movie).delete(movies::delete_movie),
        )
        .route("/:tmdb_id/refresh", post(movies::refresh_movie))
        .route("/:tmdb_id/poster", get(movies::get_poster));

    Router::new()
        .route("/health", get(crate::health_check))
        .route("/api/search", get(search::search_movies))
        .route("/api/configuration", get(configuration::get_configuration))
        .nest("/api/movies", movies_routes)
        .layer(cors(&state.config.server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// If no origins are configured, only same-origin requests are allowed.
fn cors(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    if origins.is_empty() {
        return layer;
    }

    let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
