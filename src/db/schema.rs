//! SQL DDL for the two tables. Both statements are idempotent and are run on
//! every startup.

/// Admin credentials. Usernames are deliberately not `UNIQUE`.
pub const ADMINS_TABLE: &str = "CREATE TABLE IF NOT EXISTS admins (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    password TEXT NOT NULL
)";

/// Student records. `level` carries no range check; the form enforces 1..=10.
pub const STUDENTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    studentNumber TEXT,
    firstName TEXT,
    lastName TEXT,
    program TEXT,
    level INTEGER
)";
