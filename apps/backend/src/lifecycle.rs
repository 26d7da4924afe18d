//! Startup and shutdown hooks.
//!
//! `main.rs` runs these around the server; tests run them around a test
//! server so the same initialization happens in both.

use crate::db::movies;
use crate::error::Result;
use crate::AppState;

/// Runs before the first request is served: applies migrations.
pub async fn startup(state: &AppState) -> Result<()> {
    state.db.migrate().await?;

    if state.tmdb().has_token() {
        tracing::info!(api_url = %state.tmdb().base_url(), "TMDB client ready");
    } else {
        tracing::warn!("TMDB API token not configured - metadata lookups will be unavailable");
    }

    tracing::info!("Startup complete");
    Ok(())
}

/// Runs after the last request has been served.
pub async fn shutdown(state: &AppState) -> Result<()> {
    let conn = state.db.lock().await;
    conn.execute_batch("PRAGMA optimize;")?;
    let cached = movies::count(&conn)?;

    tracing::info!(
        cached_movies = cached,
        uptime_secs = state.start_time().elapsed().as_secs(),
        "Shutdown complete"
    );
    Ok(())
}
