use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

use learnia_api::{ApiState, OriginPolicy};
use learnia_core::config::{CatalogConfig, EmbeddingConfig, FavoritesConfig};
use learnia_core::embedding::titan::TitanEmbedding;
use learnia_core::engine::SearchEngine;
use learnia_mongo::MongoCatalog;
use learnia_postgres::PgFavorites;

#[derive(Parser)]
#[command(
    name = "learnia",
    about = "Stateless HTTP search API for the Learnia course catalog"
)]
struct Cli {
    /// Listen address
    #[arg(long, default_value = "0.0.0.0:8080", env = "BIND_ADDR")]
    bind_addr: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Comma-separated allowed CORS origins; empty allows every origin
    #[arg(long, default_value = "", env = "CORS_ALLOW_ORIGINS")]
    cors_allow_origins: String,

    /// Bedrock embedding model id
    #[arg(long, default_value = "amazon.titan-embed-text-v2:0", env = "EMBEDDING_MODEL")]
    embedding_model: String,

    /// AWS region hosting the embedding model
    #[arg(long, default_value = "us-east-2", env = "AWS_REGION")]
    aws_region: String,

    /// Expected embedding dimensionality
    #[arg(long, default_value = "1024", env = "EMBEDDING_DIM")]
    embedding_dim: usize,

    /// MongoDB connection string
    #[arg(long, env = "ATLAS_URI")]
    atlas_uri: String,

    #[arg(long, default_value = "learnia_db", env = "DATABASE_NAME")]
    database_name: String,

    #[arg(long, default_value = "courses", env = "COLLECTION_NAME")]
    collection_name: String,

    /// Atlas vector search index name
    #[arg(long, default_value = "default", env = "ATLAS_SEARCH_INDEX")]
    atlas_search_index: String,

    #[arg(long, default_value = "10000", env = "MONGO_CONNECT_TIMEOUT_MS")]
    mongo_connect_timeout_ms: u64,

    #[arg(long, default_value = "10000", env = "MONGO_SERVER_SELECTION_TIMEOUT_MS")]
    mongo_server_selection_timeout_ms: u64,

    #[arg(long, env = "POSTGRES_HOST")]
    postgres_host: String,

    #[arg(long, default_value = "5432", env = "POSTGRES_PORT")]
    postgres_port: u16,

    #[arg(long, default_value = "postgres", env = "POSTGRES_DB")]
    postgres_db: String,

    #[arg(long, default_value = "postgres", env = "POSTGRES_USER")]
    postgres_user: String,

    #[arg(long, env = "POSTGRES_PASSWORD")]
    postgres_password: String,

    /// Require TLS for the relational connection
    #[arg(long, default_value = "false", env = "DB_SSL", action = clap::ArgAction::Set)]
    db_ssl: bool,

    /// Favorites table name (alphanumeric and underscore only)
    #[arg(long, default_value = "user_favorites", env = "FAVORITES_TABLE")]
    favorites_table: String,

    #[arg(long, default_value = "1", env = "POSTGRES_POOL_MIN")]
    postgres_pool_min: u32,

    #[arg(long, default_value = "5", env = "POSTGRES_POOL_MAX")]
    postgres_pool_max: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_new(&cli.log_level)?)
        .with_writer(std::io::stderr)
        .init();

    // Each collaborator is built once per process and shared across requests.
    let embedding = Arc::new(
        TitanEmbedding::new(EmbeddingConfig {
            model_id: cli.embedding_model,
            region: cli.aws_region,
            dimensions: cli.embedding_dim,
            cache_capacity: 512,
        })
        .await,
    );

    let catalog = Arc::new(
        MongoCatalog::connect(&CatalogConfig {
            uri: cli.atlas_uri,
            database: cli.database_name,
            collection: cli.collection_name,
            search_index: cli.atlas_search_index,
            connect_timeout_ms: cli.mongo_connect_timeout_ms,
            server_selection_timeout_ms: cli.mongo_server_selection_timeout_ms,
        })
        .await?,
    );

    let favorites = Arc::new(
        PgFavorites::connect(&FavoritesConfig {
            host: cli.postgres_host,
            port: cli.postgres_port,
            database: cli.postgres_db,
            user: cli.postgres_user,
            password: cli.postgres_password,
            ssl: cli.db_ssl,
            table: cli.favorites_table,
            pool_min: cli.postgres_pool_min,
            pool_max: cli.postgres_pool_max,
        })
        .await?,
    );

    let engine = SearchEngine::new(embedding, catalog, favorites);
    let state = Arc::new(ApiState::new(
        engine,
        OriginPolicy::from_list(&cli.cors_allow_origins),
    ));

    let listener = tokio::net::TcpListener::bind(cli.bind_addr).await?;
    tracing::info!(addr = %cli.bind_addr, "listening");
    axum::serve(listener, learnia_server::app(state)).await?;
    Ok(())
}
