//! Configuration structs for the external collaborators.
//!
//! The server binary populates these from environment-backed CLI flags;
//! tests construct them directly.

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Bedrock model id, e.g. `amazon.titan-embed-text-v2:0`.
    pub model_id: String,
    /// AWS region hosting the model.
    pub region: String,
    /// Expected embedding dimensionality; responses of any other width are rejected.
    pub dimensions: usize,
    /// Capacity of the per-process query-text cache.
    pub cache_capacity: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: "amazon.titan-embed-text-v2:0".to_string(),
            region: "us-east-2".to_string(),
            dimensions: 1024,
            cache_capacity: 512,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// MongoDB connection string.
    pub uri: String,
    pub database: String,
    pub collection: String,
    /// Atlas vector search index name.
    pub search_index: String,
    pub connect_timeout_ms: u64,
    pub server_selection_timeout_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            database: "learnia_db".to_string(),
            collection: "courses".to_string(),
            search_index: "default".to_string(),
            connect_timeout_ms: 10_000,
            server_selection_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FavoritesConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub ssl: bool,
    /// Favorites table name; must be alphanumeric/underscore since it is
    /// interpolated as an identifier.
    pub table: String,
    pub pool_min: u32,
    pub pool_max: u32,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 5432,
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            ssl: false,
            table: "user_favorites".to_string(),
            pool_min: 1,
            pool_max: 5,
        }
    }
}
