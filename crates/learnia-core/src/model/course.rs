use serde::{Deserialize, Serialize};

/// Read-only projection of a catalog document. Never mutated by this
/// service; identifiers come from the store's native id or a legacy alias.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Course {
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub platform: String,
    pub rating: Option<f64>,
    pub duration: Option<String>,
    pub price: Option<f64>,
    pub language: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub students_count: Option<i64>,

    /// Vector-similarity score; present only on search results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    // Ingestion metadata, present only on by-id reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_dim: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<String>,
}

/// Category aggregate, derived on each request; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub count: i64,
}
