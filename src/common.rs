#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Postgres error: {0}")]
    Postgres(#[from] sqlx::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlite::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Error creating table")]
    CreateTable(#[source] StoreError),
    #[error("Error inserting batch #{batch}")]
    InsertBatch {
        batch: usize,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Database username is missing (set DB_USERNAME or pass --db-username)")]
    MissingUsername,
    #[error("Invalid database url")]
    InvalidDatabaseUrl(#[source] sqlx::Error),
    #[error("Invalid ssl mode: {0}")]
    InvalidSslMode(String),
}

/// Completion percentage with two decimals, `"0.00"` to `"100.00"`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percent(done: usize, total: usize) -> String {
    if total == 0 {
        return "100.00".into();
    }
    format!("{:.2}", done as f64 / total as f64 * 100.0)
}
