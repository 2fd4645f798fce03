//! Client configuration types.

/// Connection identity: database plus login credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Database name.
    pub database: String,
    /// Login user name.
    pub username: String,
    /// Login password (or API key).
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
