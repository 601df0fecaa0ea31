//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. These stay light-weight data holders: the stores own persisted state
//! and every value here is a transient copy with no link back to storage.

use std::fmt;

/// Lowest grade level the student form accepts.
pub const LEVEL_MIN: i64 = 1;
/// Highest grade level the student form accepts. Storage does not enforce
/// either bound.
pub const LEVEL_MAX: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
/// An administrator allowed to open the student screen. The password is kept
/// verbatim; no hashing happens anywhere in the application.
pub struct AdminAccount {
    /// Primary key assigned by SQLite.
    pub id: i64,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// In-memory representation of one row of the `students` table.
pub struct Student {
    /// Primary key from the database. Zero until the store assigns one on
    /// insert; the store ignores whatever value a caller puts here.
    pub id: i64,
    /// School-issued identifier. Not unique at the storage layer.
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
    pub program: String,
    /// Grade level, 1 through 10 when entered through the form.
    pub level: i64,
}

impl Student {
    /// Build a record that has not been persisted yet.
    pub fn new(
        student_number: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        program: impl Into<String>,
        level: i64,
    ) -> Self {
        Self {
            id: 0,
            student_number: student_number.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            program: program.into(),
            level,
        }
    }

    /// `First Last`, used in status messages and confirmation dialogs.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.full_name(), self.student_number)
    }
}
