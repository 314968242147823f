use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// A handful of connections covers a personal tracker; requests are short
/// single-statement reads and writes.
pub async fn create_pool(database_url: &str) -> PgPool {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await
        .expect("Failed to create database pool")
}
