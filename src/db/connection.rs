use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::trace;

use crate::error::StoreError;

/// Handle naming the SQLite file both stores read and write. Cloning is cheap
/// and every store keeps its own copy; no connection is held between calls.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection, creating the parent directory on first use.
    /// Callers let the returned connection drop once their statement is done,
    /// which closes the file on every exit path.
    pub(crate) fn connect(&self) -> Result<Connection, StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        trace!(path = %self.path.display(), "opening database");
        Connection::open(&self.path).map_err(|source| StoreError::Open {
            path: self.path.clone(),
            source,
        })
    }
}
