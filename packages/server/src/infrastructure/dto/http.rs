//! HTTP API response DTOs.

use serde::Serialize;

/// Response of `GET /photo-manifest`: the relative paths of the player
/// photo assets, or an empty list plus an error description.
#[derive(Debug, Serialize)]
pub struct PhotoManifestDto {
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
