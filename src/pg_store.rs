use std::time::Duration;

use log::{debug, info};
use sqlx::{
    postgres::{PgConnectOptions, PgPool, PgPoolOptions},
    Postgres, QueryBuilder,
};

use crate::{
    common::StoreError,
    record::UserRecord,
    schema::{Dialect, TableSchema},
    store::{statement_chunks, UserStore},
};

/// Bind parameter limit of the Postgres wire protocol.
pub const PG_MAX_PARAMS: usize = 65_535;

pub struct PgUserStore {
    pool: PgPool,
    schema: TableSchema,
}

impl PgUserStore {
    /// Opens a pool holding a single connection; the loader never issues
    /// statements concurrently.
    ///
    /// # Errors
    ///
    /// When the first connection cannot be established.
    pub async fn connect(options: PgConnectOptions) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(8))
            .connect_with(options)
            .await?;

        Ok(Self::from_pool(pool))
    }

    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            schema: TableSchema::users(),
        }
    }

    /// # Errors
    ///
    /// On database failure.
    pub async fn count_users(&self) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.schema.name);
        let count = sqlx::query_scalar::<Postgres, i64>(&sql)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.unsigned_abs())
    }
}

/// Multi-row insert with one `$n` placeholder per value.
#[must_use]
pub fn insert_users_query<'a>(
    schema: &TableSchema,
    users: &'a [UserRecord],
) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(schema.insert_prefix());
    builder.push_values(users, |mut row, user| {
        for value in user.columns() {
            row.push_bind(value);
        }
    });
    builder
}

impl UserStore for PgUserStore {
    async fn create_users_table(&mut self) -> Result<(), StoreError> {
        let sql = self.schema.create_table_sql(Dialect::Postgres);
        sqlx::query::<Postgres>(&sql)
            .execute(&self.pool)
            .await?;
        info!("Users table created or already exists");
        Ok(())
    }

    async fn insert_users(&mut self, users: &[UserRecord]) -> Result<u64, StoreError> {
        if users.is_empty() {
            return Ok(0);
        }

        let chunks = statement_chunks(users, PG_MAX_PARAMS);
        if chunks.len() == 1 {
            let result = insert_users_query(&self.schema, users)
                .build()
                .execute(&self.pool)
                .await?;
            return Ok(result.rows_affected());
        }

        debug!(
            "Splitting {} rows into {} statements",
            users.len(),
            chunks.len()
        );

        // Dropping the transaction without commit rolls it back.
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for chunk in chunks {
            let result = insert_users_query(&self.schema, chunk)
                .build()
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;

        Ok(inserted)
    }

    async fn close(self) {
        self.pool.close().await;
        debug!("Postgres pool closed");
    }
}
