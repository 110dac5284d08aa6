pub mod views;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;

/// Pool sized as `DB_POOL_SIZE + DB_MAX_OVERFLOW`, with idle connections
/// trimmed back to the base size. Connections are pinged before use.
pub async fn create_pool(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .min_connections(config.db_pool_size)
        .max_connections(config.db_pool_size + config.db_max_overflow)
        .test_before_acquire(true)
        .idle_timeout(Duration::from_secs(600))
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

pub async fn check_connection(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ColumnInfo {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

/// Every column of every base table in `schema`, ordered by table then position.
pub async fn describe_schema(pool: &PgPool, schema: &str) -> anyhow::Result<Vec<ColumnInfo>> {
    let columns = sqlx::query_as::<_, ColumnInfo>(
        "SELECT c.table_name::TEXT  AS table_name,
                c.column_name::TEXT AS column_name,
                c.data_type::TEXT   AS data_type,
                (c.is_nullable = 'YES') AS is_nullable
         FROM information_schema.columns c
         JOIN information_schema.tables t
           ON t.table_schema = c.table_schema AND t.table_name = c.table_name
         WHERE c.table_schema = $1 AND t.table_type = 'BASE TABLE'
         ORDER BY c.table_name, c.ordinal_position",
    )
    .bind(schema)
    .fetch_all(pool)
    .await?;
    Ok(columns)
}
