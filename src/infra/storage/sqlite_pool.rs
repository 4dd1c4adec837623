use std::path::Path;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

/// Open (creating if needed) the SQLite database behind `database_url`.
///
/// In-memory databases are per-connection, so they get a single connection.
pub async fn connect_sqlite(database_url: &str) -> anyhow::Result<Pool<Sqlite>> {
    let in_memory = database_url.contains(":memory:");

    let path_str = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    if !in_memory && !Path::new(path_str).exists() {
        if let Some(parent) = Path::new(path_str).parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::File::create(path_str)?;
    }

    let conn_str = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite://{}", database_url)
    };

    let max_connections = if in_memory { 1 } else { 5 };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(&conn_str)
        .await?;
    Ok(pool)
}
