use std::path::Path;

use log::{debug, info};
use sqlite::{Connection, State};

use crate::{
    common::StoreError,
    record::{UserRecord, USER_COLUMN_COUNT},
    schema::{Dialect, TableSchema},
    store::{statement_chunks, UserStore},
};

/// Default `SQLITE_MAX_VARIABLE_NUMBER` of SQLite 3.32+.
pub const SQLITE_MAX_PARAMS: usize = 32_766;

pub struct SqliteUserStore {
    connection: Connection,
    schema: TableSchema,
    max_params: usize,
}

impl SqliteUserStore {
    /// Opens (or creates) the database file. `":memory:"` gives a private
    /// in-memory database.
    ///
    /// # Errors
    ///
    /// When the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let connection = sqlite::open(path)?;
        Ok(Self {
            connection,
            schema: TableSchema::users(),
            max_params: SQLITE_MAX_PARAMS,
        })
    }

    /// Lowers the bound parameter ceiling, batches over it are split.
    #[must_use]
    pub fn with_max_params(mut self, max_params: usize) -> Self {
        self.max_params = max_params;
        self
    }

    /// # Errors
    ///
    /// On database failure.
    pub fn count_users(&self) -> Result<u64, StoreError> {
        let mut statement = self
            .connection
            .prepare(format!("SELECT COUNT(*) FROM {}", self.schema.name))?;
        statement.next()?;
        let count = statement.read::<i64, _>(0)?;
        Ok(count.unsigned_abs())
    }

    fn insert_statement_sql(&self, row_count: usize) -> String {
        let row = format!("({})", vec!["?"; USER_COLUMN_COUNT].join(", "));
        format!(
            "{}VALUES {}",
            self.schema.insert_prefix(),
            vec![row.as_str(); row_count].join(", ")
        )
    }

    fn insert_chunk(&self, users: &[UserRecord]) -> Result<u64, StoreError> {
        let mut statement = self
            .connection
            .prepare(self.insert_statement_sql(users.len()))?;

        let values = users.iter().flat_map(UserRecord::columns);
        for (idx, value) in values.enumerate() {
            // Positions are 1-based.
            statement.bind((idx + 1, value))?;
        }
        while let State::Row = statement.next()? {}

        Ok(users.len() as u64)
    }

    fn insert_chunks_in_transaction(&self, users: &[UserRecord]) -> Result<u64, StoreError> {
        self.connection.execute("BEGIN")?;

        let mut inserted = 0;
        for chunk in statement_chunks(users, self.max_params) {
            match self.insert_chunk(chunk) {
                Ok(n) => inserted += n,
                Err(err) => {
                    self.rollback();
                    return Err(err);
                }
            }
        }

        if let Err(err) = self.connection.execute("COMMIT") {
            // A failed COMMIT leaves the transaction open.
            self.rollback();
            return Err(err.into());
        }
        Ok(inserted)
    }

    fn rollback(&self) {
        if let Err(err) = self.connection.execute("ROLLBACK") {
            debug!("Rollback failed: {}", err);
        }
    }
}

impl UserStore for SqliteUserStore {
    async fn create_users_table(&mut self) -> Result<(), StoreError> {
        self.connection
            .execute(self.schema.create_table_sql(Dialect::Sqlite))?;
        info!("Users table created or already exists");
        Ok(())
    }

    async fn insert_users(&mut self, users: &[UserRecord]) -> Result<u64, StoreError> {
        if users.is_empty() {
            return Ok(0);
        }

        if statement_chunks(users, self.max_params).len() == 1 {
            self.insert_chunk(users)
        } else {
            debug!("Splitting {} rows into multiple statements", users.len());
            self.insert_chunks_in_transaction(users)
        }
    }

    async fn close(self) {
        drop(self.connection);
        debug!("SQLite connection closed");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn user(i: usize) -> UserRecord {
        UserRecord {
            first_name: format!("F{i}"),
            last_name: format!("L{i}"),
            name: format!("F{i} L{i}"),
            email: format!("f{i}@example.com"),
            ip_address: "192.168.0.1".into(),
        }
    }

    #[test]
    fn test_insert_statement_sql() {
        let store = SqliteUserStore::open(":memory:").unwrap();

        assert_eq!(
            "INSERT INTO users (firstName, lastName, name, email, ipAddress) VALUES (?, ?, ?, ?, ?), (?, ?, ?, ?, ?)",
            store.insert_statement_sql(2)
        );
    }

    #[tokio::test]
    async fn test_create_twice_is_fine() {
        let mut store = SqliteUserStore::open(":memory:").unwrap();

        assert!(store.create_users_table().await.is_ok());
        assert!(store.create_users_table().await.is_ok());
        assert_eq!(0, store.count_users().unwrap());
    }

    #[tokio::test]
    async fn test_insert_users() {
        let mut store = SqliteUserStore::open(":memory:").unwrap();
        store.create_users_table().await.unwrap();

        let users: Vec<UserRecord> = (0..10).map(user).collect();
        assert_eq!(10, store.insert_users(&users).await.unwrap());
        assert_eq!(0, store.insert_users(&[]).await.unwrap());
        assert_eq!(10, store.count_users().unwrap());
    }

    #[tokio::test]
    async fn test_insert_rejects_too_long_value() {
        let mut store = SqliteUserStore::open(":memory:").unwrap();
        store.create_users_table().await.unwrap();

        let mut too_long = user(1);
        too_long.ip_address = "1".repeat(46);

        let result = store.insert_users(&[user(0), too_long]).await;
        assert!(matches!(result, Err(StoreError::Sqlite(_))));
        // The statement is all or nothing.
        assert_eq!(0, store.count_users().unwrap());
    }

    #[tokio::test]
    async fn test_insert_over_ceiling_is_split() {
        let mut store = SqliteUserStore::open(":memory:")
            .unwrap()
            .with_max_params(USER_COLUMN_COUNT * 4);
        store.create_users_table().await.unwrap();

        let users: Vec<UserRecord> = (0..10).map(user).collect();
        assert_eq!(10, store.insert_users(&users).await.unwrap());
        assert_eq!(10, store.count_users().unwrap());
    }

    #[tokio::test]
    async fn test_split_insert_rolls_back_whole_batch() {
        let mut store = SqliteUserStore::open(":memory:")
            .unwrap()
            .with_max_params(USER_COLUMN_COUNT * 2);
        store.create_users_table().await.unwrap();

        let mut users: Vec<UserRecord> = (0..6).map(user).collect();
        users[5].first_name = "x".repeat(101);

        assert!(store.insert_users(&users).await.is_err());
        assert_eq!(0, store.count_users().unwrap());

        // Connection is usable after the rollback.
        assert_eq!(2, store.insert_users(&users[..2]).await.unwrap());
        assert_eq!(2, store.count_users().unwrap());
    }
}
