use axum::{extract::State, Json};

use crate::error::Result;
use crate::services::tmdb::ImageConfiguration;
use crate::AppState;

/// GET /api/configuration
///
/// Returns TMDB's image configuration, fetched once per process.
pub async fn get_configuration(State(state): State<AppState>) -> Result<Json<ImageConfiguration>> {
    let images = state.images.get(state.tmdb()).await?;
    Ok(Json(images.clone()))
}
