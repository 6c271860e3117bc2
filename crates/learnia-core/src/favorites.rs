//! Favorites repository contract and an in-memory double for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::favorite::FavoriteEntry;

#[async_trait::async_trait]
pub trait FavoritesStore: Send + Sync {
    /// Existence check on the (user, course) composite key.
    async fn is_favorite(&self, user_id: &str, course_id: &str) -> Result<bool>;

    /// Force the favorite state. Idempotent in both directions: adding an
    /// existing favorite and removing an absent one are no-ops, and the call
    /// reports `desired` on success regardless of prior state.
    async fn set_favorite(&self, user_id: &str, course_id: &str, desired: bool) -> Result<bool>;

    /// The user's favorites, newest first.
    async fn list_favorites(&self, user_id: &str) -> Result<Vec<FavoriteEntry>>;
}

#[derive(Default)]
pub struct InMemoryFavorites {
    rows: Mutex<HashMap<(String, String), DateTime<Utc>>>,
}

impl InMemoryFavorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total stored rows across all users; used by idempotence tests.
    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait::async_trait]
impl FavoritesStore for InMemoryFavorites {
    async fn is_favorite(&self, user_id: &str, course_id: &str) -> Result<bool> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        Ok(rows.contains_key(&(user_id.to_string(), course_id.to_string())))
    }

    async fn set_favorite(&self, user_id: &str, course_id: &str, desired: bool) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let key = (user_id.to_string(), course_id.to_string());
        if desired {
            rows.entry(key).or_insert_with(Utc::now);
        } else {
            rows.remove(&key);
        }
        Ok(desired)
    }

    async fn list_favorites(&self, user_id: &str) -> Result<Vec<FavoriteEntry>> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries: Vec<FavoriteEntry> = rows
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .map(|((_, course_id), created_at)| FavoriteEntry {
                course_id: course_id.clone(),
                created_at: *created_at,
            })
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }
}
