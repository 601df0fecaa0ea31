//! Typed failures for the persistence layer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while talking to the SQLite file. A missing
/// row is not an error; writes report it through [`WriteOutcome`] instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create data directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open SQLite database {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to {action}")]
    Statement {
        action: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

impl StoreError {
    pub(crate) fn statement(action: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| StoreError::Statement { action, source }
    }
}

/// Result of an update or delete addressed by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A row with the id existed and was changed.
    Applied,
    /// No row carried the id; nothing was touched.
    NotFound,
}

impl WriteOutcome {
    pub(crate) fn from_rows(rows: usize) -> Self {
        if rows == 0 {
            WriteOutcome::NotFound
        } else {
            WriteOutcome::Applied
        }
    }

    pub fn is_applied(self) -> bool {
        self == WriteOutcome::Applied
    }
}
