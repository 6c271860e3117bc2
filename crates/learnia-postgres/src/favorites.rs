use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use learnia_core::config::FavoritesConfig;
use learnia_core::error::{Error, Result};
use learnia_core::favorites::FavoritesStore;
use learnia_core::model::favorite::FavoriteEntry;

/// Favorites repository over a PostgreSQL pool.
///
/// The table is expected to pre-exist with a unique constraint on
/// `(user_id, mongodb_course_id)`; its name is validated as an identifier
/// before being interpolated, and row values are always bound parameters.
pub struct PgFavorites {
    pool: PgPool,
    table: String,
}

impl PgFavorites {
    /// Build the connection pool and validate the table name.
    pub async fn connect(config: &FavoritesConfig) -> Result<Self> {
        if config.host.is_empty() || config.password.is_empty() {
            return Err(Error::ServiceUnavailable(
                "favorites host and password are required".to_string(),
            ));
        }
        let table = validated_table(&config.table)?;

        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(if config.ssl {
                PgSslMode::Require
            } else {
                PgSslMode::Prefer
            });

        let pool = PgPoolOptions::new()
            .min_connections(config.pool_min)
            .max_connections(config.pool_max.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| Error::ServiceUnavailable(format!("favorites pool failed: {e}")))?;

        Ok(Self { pool, table })
    }

    /// Build a `PgFavorites` from an existing pool (useful for tests).
    pub fn from_pool(pool: PgPool, table: &str) -> Result<Self> {
        Ok(Self {
            pool,
            table: validated_table(table)?,
        })
    }
}

fn map_sqlx(e: sqlx::Error) -> Error {
    tracing::error!(error = %e, "favorites query failed");
    Error::Favorites(e.to_string())
}

fn validated_table(table: &str) -> Result<String> {
    let valid = !table.is_empty()
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && table.chars().any(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(table.to_string())
    } else {
        Err(Error::ServiceUnavailable(format!(
            "invalid favorites table name: {table:?}"
        )))
    }
}

#[async_trait::async_trait]
impl FavoritesStore for PgFavorites {
    async fn is_favorite(&self, user_id: &str, course_id: &str) -> Result<bool> {
        let sql = format!(
            "SELECT 1 FROM {} WHERE user_id = $1 AND mongodb_course_id = $2 LIMIT 1",
            self.table
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(row.is_some())
    }

    async fn set_favorite(&self, user_id: &str, course_id: &str, desired: bool) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        if desired {
            let sql = format!(
                "INSERT INTO {} (favorite_id, user_id, mongodb_course_id, created_at) \
                 VALUES ($1, $2, $3, NOW()) \
                 ON CONFLICT (user_id, mongodb_course_id) DO NOTHING",
                self.table
            );
            sqlx::query(&sql)
                .bind(Uuid::new_v4())
                .bind(user_id)
                .bind(course_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx)?;
        } else {
            let sql = format!(
                "DELETE FROM {} WHERE user_id = $1 AND mongodb_course_id = $2",
                self.table
            );
            sqlx::query(&sql)
                .bind(user_id)
                .bind(course_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx)?;
        }

        tx.commit().await.map_err(map_sqlx)?;
        Ok(desired)
    }

    async fn list_favorites(&self, user_id: &str) -> Result<Vec<FavoriteEntry>> {
        let sql = format!(
            "SELECT mongodb_course_id, created_at FROM {} \
             WHERE user_id = $1 ORDER BY created_at DESC",
            self.table
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.into_iter()
            .map(|row| {
                Ok(FavoriteEntry {
                    course_id: row.try_get("mongodb_course_id").map_err(map_sqlx)?,
                    created_at: row.try_get("created_at").map_err(map_sqlx)?,
                })
            })
            .collect()
    }
}
