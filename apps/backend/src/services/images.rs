//! Memoized TMDB image configuration.

use tokio::sync::OnceCell;

use crate::error::{AppError, Result};
use crate::services::tmdb::{ImageConfiguration, TmdbClient};

/// Fetches `/configuration` on first use and serves the cached copy after.
///
/// A failed fetch leaves the cell empty, so the next call retries.
#[derive(Default)]
pub struct ImageSettings {
    cell: OnceCell<ImageConfiguration>,
}

impl ImageSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, tmdb: &TmdbClient) -> Result<&ImageConfiguration> {
        self.cell
            .get_or_try_init(|| async {
                let config = tmdb.configuration().await?;
                tracing::info!(
                    poster_sizes = config.images.poster_sizes.len(),
                    "Loaded TMDB image configuration"
                );
                Ok::<_, AppError>(config.images)
            })
            .await
    }
}
