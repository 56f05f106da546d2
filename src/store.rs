use crate::{
    common::StoreError, pg_store::PgUserStore, record::UserRecord,
    sqlite_store::SqliteUserStore,
};

/// Destination of synthesized users.
///
/// Implementations insert a whole slice atomically: either every row of the
/// call is persisted or none is.
#[allow(async_fn_in_trait)]
pub trait UserStore {
    /// Creates the users table unless it already exists.
    ///
    /// # Errors
    ///
    /// On any database failure other than the table already existing.
    async fn create_users_table(&mut self) -> Result<(), StoreError>;

    /// Inserts all `users`, returning the number of rows written.
    ///
    /// # Errors
    ///
    /// On any database failure, including values over the column limits.
    async fn insert_users(&mut self, users: &[UserRecord]) -> Result<u64, StoreError>;

    /// Releases the underlying connection(s).
    async fn close(self);
}

/// Splits `users` into slices whose bound parameters stay within
/// `max_params`. Always yields at least one row per slice.
pub fn statement_chunks(
    users: &[UserRecord],
    max_params: usize,
) -> std::slice::Chunks<'_, UserRecord> {
    let rows_per_statement = (max_params / crate::record::USER_COLUMN_COUNT).max(1);
    users.chunks(rows_per_statement)
}

pub enum AnyUserStore {
    Postgres(PgUserStore),
    Sqlite(SqliteUserStore),
}

impl AnyUserStore {
    /// Creates the users table if needed and returns how many rows it holds.
    ///
    /// # Errors
    ///
    /// When either the table creation or the count fails.
    pub async fn create_and_count_users(&mut self) -> Result<u64, StoreError> {
        self.create_users_table().await?;
        self.count_users().await
    }

    /// # Errors
    ///
    /// On database failure.
    pub async fn count_users(&self) -> Result<u64, StoreError> {
        match self {
            Self::Postgres(store) => store.count_users().await,
            Self::Sqlite(store) => store.count_users(),
        }
    }
}

impl UserStore for AnyUserStore {
    async fn create_users_table(&mut self) -> Result<(), StoreError> {
        match self {
            Self::Postgres(store) => store.create_users_table().await,
            Self::Sqlite(store) => store.create_users_table().await,
        }
    }

    async fn insert_users(&mut self, users: &[UserRecord]) -> Result<u64, StoreError> {
        match self {
            Self::Postgres(store) => store.insert_users(users).await,
            Self::Sqlite(store) => store.insert_users(users).await,
        }
    }

    async fn close(self) {
        match self {
            Self::Postgres(store) => store.close().await,
            Self::Sqlite(store) => store.close().await,
        }
    }
}
