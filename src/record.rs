/// Number of values a record binds into an insert statement.
pub const USER_COLUMN_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    pub email: String,
    pub ip_address: String,
}

impl UserRecord {
    /// Values in insert column order: `firstName, lastName, name, email, ipAddress`.
    #[must_use]
    pub fn columns(&self) -> [&str; USER_COLUMN_COUNT] {
        [
            &self.first_name,
            &self.last_name,
            &self.name,
            &self.email,
            &self.ip_address,
        ]
    }
}
