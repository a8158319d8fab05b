//! Database module - SQLite feedback store connection and schema

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;

/// Create database connection pool, creating the file if missing
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(std::time::Duration::from_secs(5))
        .disable_statement_logging();

    SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
}

/// Ensure the feedback table exists. Safe to call repeatedly.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA_SQL.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Feedback schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- User feedback on predictions (append-only)
CREATE TABLE IF NOT EXISTS feedback (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    features TEXT NOT NULL,
    model_prediction INTEGER NOT NULL,
    prediction_label TEXT NOT NULL,
    user_provided_label TEXT NOT NULL,
    verified INTEGER DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_feedback_user_label ON feedback(user_provided_label);
"#;
