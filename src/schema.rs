use indexmap::IndexMap;

pub const USERS_TABLE: &str = "users";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSchema {
    /// Auto-incrementing integer primary key, assigned by the database.
    Serial,
    Varchar(usize),
}

impl FieldSchema {
    fn column_definition(self, name: &str, dialect: Dialect) -> String {
        match (self, dialect) {
            (Self::Serial, Dialect::Postgres) => format!("{name} SERIAL PRIMARY KEY"),
            (Self::Serial, Dialect::Sqlite) => {
                format!("{name} INTEGER PRIMARY KEY AUTOINCREMENT")
            }
            (Self::Varchar(len), Dialect::Postgres) => format!("{name} VARCHAR({len})"),
            // SQLite accepts any length for VARCHAR, the CHECK makes it reject instead.
            (Self::Varchar(len), Dialect::Sqlite) => {
                format!("{name} VARCHAR({len}) CHECK (length({name}) <= {len})")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: String,
    pub fields: IndexMap<String, FieldSchema>,
}

impl TableSchema {
    /// The destination relation of the loader. Column order matches
    /// [`crate::record::UserRecord::columns`].
    #[must_use]
    pub fn users() -> Self {
        Self {
            name: USERS_TABLE.into(),
            fields: IndexMap::from([
                ("id".into(), FieldSchema::Serial),
                ("firstName".into(), FieldSchema::Varchar(100)),
                ("lastName".into(), FieldSchema::Varchar(100)),
                ("name".into(), FieldSchema::Varchar(200)),
                ("email".into(), FieldSchema::Varchar(200)),
                ("ipAddress".into(), FieldSchema::Varchar(45)),
            ]),
        }
    }

    #[must_use]
    pub fn create_table_sql(&self, dialect: Dialect) -> String {
        let columns = self
            .fields
            .iter()
            .map(|(name, field_schema)| {
                format!("    {}", field_schema.column_definition(name, dialect))
            })
            .collect::<Vec<_>>()
            .join(",\n");

        format!("CREATE TABLE IF NOT EXISTS {} (\n{}\n)", self.name, columns)
    }

    /// Columns the loader supplies values for, everything but serial ones.
    #[must_use]
    pub fn insert_columns(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, field_schema)| **field_schema != FieldSchema::Serial)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// `INSERT INTO <table> (<columns>) ` without the values part.
    #[must_use]
    pub fn insert_prefix(&self) -> String {
        format!(
            "INSERT INTO {} ({}) ",
            self.name,
            self.insert_columns().join(", ")
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_insert_columns_skip_serial() {
        let schema = TableSchema::users();
        assert_eq!(
            vec!["firstName", "lastName", "name", "email", "ipAddress"],
            schema.insert_columns()
        );
        assert_eq!(
            "INSERT INTO users (firstName, lastName, name, email, ipAddress) ",
            schema.insert_prefix()
        );
    }

    #[test]
    fn test_create_table_sql_postgres() {
        let sql = TableSchema::users().create_table_sql(Dialect::Postgres);

        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS users ("));
        assert!(sql.contains("id SERIAL PRIMARY KEY"));
        assert!(sql.contains("firstName VARCHAR(100)"));
        assert!(sql.contains("lastName VARCHAR(100)"));
        assert!(sql.contains("name VARCHAR(200)"));
        assert!(sql.contains("email VARCHAR(200)"));
        assert!(sql.contains("ipAddress VARCHAR(45)"));
        assert!(!sql.contains("CHECK"));
    }

    #[test]
    fn test_create_table_sql_sqlite_enforces_lengths() {
        let sql = TableSchema::users().create_table_sql(Dialect::Sqlite);

        assert!(sql.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("firstName VARCHAR(100) CHECK (length(firstName) <= 100)"));
        assert!(sql.contains("ipAddress VARCHAR(45) CHECK (length(ipAddress) <= 45)"));
    }
}
