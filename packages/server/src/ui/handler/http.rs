//! HTTP API endpoint handlers.

use std::path::Path;
use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::{domain::Room, infrastructure::dto::http::PhotoManifestDto, ui::state::AppState};

/// Subdirectory of the assets root holding the player photos.
const PHOTO_DIR: &str = "Fotos";

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// List the player photo assets so the front-end knows which images
/// exist. A failure answers 500 with an empty list plus the error text.
pub async fn photo_manifest(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<PhotoManifestDto>) {
    match list_photos(&state.assets_dir).await {
        Ok(files) => (
            StatusCode::OK,
            Json(PhotoManifestDto { files, error: None }),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(PhotoManifestDto {
                files: Vec::new(),
                error: Some(e.to_string()),
            }),
        ),
    }
}

async fn list_photos(assets_dir: &Path) -> std::io::Result<Vec<String>> {
    let dir = assets_dir.join(PHOTO_DIR);
    let mut entries = tokio::fs::read_dir(&dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(format!("{}/{}", PHOTO_DIR, entry.file_name().to_string_lossy()));
        }
    }
    files.sort();
    Ok(files)
}

/// Debug endpoint to inspect every live room (for testing purposes)
pub async fn debug_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<Room>> {
    Json(state.registry.snapshot().await)
}
