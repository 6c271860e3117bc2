//! Request-level orchestration over the three collaborators.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogStore;
use crate::embedding::EmbeddingProvider;
use crate::error::{Error, Result};
use crate::favorites::FavoritesStore;
use crate::model::course::{Category, Course};
use crate::model::favorite::{FavoriteAction, FavoriteEntry, FavoriteStatus};
use crate::model::filters::SearchFilters;

const MIN_QUERY_CHARS: usize = 3;
const DEFAULT_LIMIT: i64 = 12;
const MAX_LIMIT: i64 = 40;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub limit: Option<i64>,
    pub filters: Option<SearchFilters>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<Course>,
    pub total: usize,
    pub query: String,
}

pub struct SearchEngine {
    pub embedding: Arc<dyn EmbeddingProvider>,
    pub catalog: Arc<dyn CatalogStore>,
    pub favorites: Arc<dyn FavoritesStore>,
}

impl SearchEngine {
    pub fn new(
        embedding: Arc<dyn EmbeddingProvider>,
        catalog: Arc<dyn CatalogStore>,
        favorites: Arc<dyn FavoritesStore>,
    ) -> Self {
        Self {
            embedding,
            catalog,
            favorites,
        }
    }

    /// Validate the query, obtain its embedding, and search the catalog.
    /// The response echoes the trimmed query.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
        let query = request.query.unwrap_or_default().trim().to_string();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Err(Error::InvalidQuery(
                "the 'query' parameter must be at least 3 characters".to_string(),
            ));
        }

        let limit = effective_limit(request.limit);
        let filters = request.filters.unwrap_or_default();

        let embedding = self.embedding.embed(&query).await?;
        let results = self.catalog.search(&embedding, limit, &filters).await?;

        Ok(SearchResponse {
            total: results.len(),
            results,
            query,
        })
    }

    pub async fn course(&self, course_id: &str) -> Result<Course> {
        self.catalog
            .course_by_id(course_id)
            .await?
            .ok_or_else(|| Error::NotFound("course not found".to_string()))
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.catalog.categories().await
    }

    pub async fn trending(&self, limit: i64) -> Result<Vec<Course>> {
        self.catalog.trending(limit).await
    }

    /// Apply the favorite transition. With `Toggle` the current state is read
    /// first and inverted; this read-then-write is not isolated against
    /// concurrent togglers of the same pair, and the last writer wins.
    pub async fn toggle_favorite(
        &self,
        user_id: &str,
        course_id: &str,
        action: FavoriteAction,
    ) -> Result<FavoriteStatus> {
        let desired = match action {
            FavoriteAction::Add => true,
            FavoriteAction::Remove => false,
            FavoriteAction::Toggle => !self.favorites.is_favorite(user_id, course_id).await?,
        };
        let is_favorite = self.favorites.set_favorite(user_id, course_id, desired).await?;
        Ok(FavoriteStatus {
            course_id: course_id.to_string(),
            is_favorite,
        })
    }

    pub async fn favorites(&self, user_id: &str) -> Result<Vec<FavoriteEntry>> {
        self.favorites.list_favorites(user_id).await
    }
}

/// Absent and zero limits take the default; the result is clamped to [1, 40].
fn effective_limit(requested: Option<i64>) -> usize {
    let limit = match requested {
        None | Some(0) => DEFAULT_LIMIT,
        Some(l) => l,
    };
    limit.clamp(1, MAX_LIMIT) as usize
}
