use rusqlite::params;
use tracing::debug;

use super::connection::Database;
use super::schema::ADMINS_TABLE;
use crate::error::StoreError;
use crate::models::AdminAccount;

/// Persists and queries administrator credentials in the `admins` table.
#[derive(Debug, Clone)]
pub struct AdminAccountStore {
    db: Database,
}

impl AdminAccountStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create the `admins` table if it does not exist yet.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        let conn = self.db.connect()?;
        conn.execute(ADMINS_TABLE, [])
            .map_err(StoreError::statement("create admins table"))?;
        Ok(())
    }

    /// True when a stored account has exactly this username and password.
    /// Both comparisons are case-sensitive and the password is compared as
    /// plain text.
    pub fn credentials_match(&self, username: &str, password: &str) -> Result<bool, StoreError> {
        let conn = self.db.connect()?;
        let found = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM admins WHERE username = ?1 AND password = ?2)",
                params![username, password],
                |row| row.get::<_, bool>(0),
            )
            .map_err(StoreError::statement("look up admin credentials"))?;

        debug!(username, found, "checked admin credentials");
        Ok(found)
    }

    /// Insert a new account without checking for duplicates. Callers that
    /// want to refuse an existing pair must call
    /// [`credentials_match`](Self::credentials_match) first.
    pub fn create_account(&self, username: &str, password: &str) -> Result<AdminAccount, StoreError> {
        let conn = self.db.connect()?;
        conn.execute(
            "INSERT INTO admins (username, password) VALUES (?1, ?2)",
            params![username, password],
        )
        .map_err(StoreError::statement("insert admin account"))?;

        let id = conn.last_insert_rowid();
        debug!(id, username, "created admin account");
        Ok(AdminAccount {
            id,
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}
