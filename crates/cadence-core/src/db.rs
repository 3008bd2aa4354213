use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::error::{CoreError, StoreError};

// Re-export the pool for use in other parts of the core crate
pub use sqlx::SqlitePool as DbPool;

const IN_MEMORY: &str = "sqlite::memory:";

/// Establishes a connection pool to the SQLite database and runs migrations.
///
/// # Arguments
///
/// * `db_path` - Path to the SQLite database file, or `sqlite::memory:` for a
///   throwaway database.
///
/// # Returns
///
/// A `Result` containing the pool or a `CoreError` if the connection fails
/// or migrations cannot be run.
pub async fn establish_connection(db_path: &str) -> Result<DbPool, CoreError> {
    let pool = if db_path == IN_MEMORY {
        // Every in-memory connection is its own database, so keep exactly one.
        let options = SqliteConnectOptions::from_str(IN_MEMORY).map_err(StoreError::from)?;
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(StoreError::from)?
    } else {
        // Create the database directory if it doesn't exist
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(StoreError::from)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StoreError::from)?
    };

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(StoreError::from)?;

    tracing::debug!(db_path, "database ready");
    Ok(pool)
}
