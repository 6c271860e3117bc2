use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One row of a user's favorites listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub course_id: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a favorite-toggle operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteStatus {
    pub course_id: String,
    pub is_favorite: bool,
}

/// Desired transition for the favorite toggle. `Toggle` reads the current
/// state and inverts it; `Add`/`Remove` force the state idempotently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteAction {
    Toggle,
    Add,
    Remove,
}

impl FavoriteAction {
    /// Parse the request's `action` field. Absent and empty mean `Toggle`;
    /// anything outside {"", "add", "remove"} is rejected.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.unwrap_or("").to_lowercase().as_str() {
            "" => Ok(FavoriteAction::Toggle),
            "add" => Ok(FavoriteAction::Add),
            "remove" => Ok(FavoriteAction::Remove),
            _ => Err(Error::InvalidAction(
                "the 'action' parameter must be add, remove, or omitted".to_string(),
            )),
        }
    }
}
