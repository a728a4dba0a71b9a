pub mod entity;
pub mod store;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::AppConfig;

/// Open the connection pool and verify connectivity with a bounded ping.
pub async fn open_pool(dsn: &str, config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .connect(dsn)
        .await?;

    tokio::time::timeout(
        Duration::from_secs(config.database.connect_timeout_secs),
        sqlx::query("SELECT 1").execute(&pool),
    )
    .await??;

    Ok(pool)
}
