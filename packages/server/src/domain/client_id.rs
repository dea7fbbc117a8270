//! Connection identifier value object.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a single connection to the server.
///
/// Generated server-side (UUID v4) when a socket connects; used as the
/// key for budgets, teams and the winner sets for the lifetime of the
/// connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

/// Error for an empty or blank client id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("client id must not be blank")]
pub struct InvalidClientId;

impl ClientId {
    /// Validate an externally supplied id (e.g. the `from`/`to` fields
    /// of a transfer offer).
    pub fn new(value: String) -> Result<Self, InvalidClientId> {
        if value.trim().is_empty() {
            return Err(InvalidClientId);
        }
        Ok(Self(value))
    }

    /// Mint a fresh id for a new connection.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
