use rusqlite::types::ValueRef;
use rusqlite::{params, Row};
use tracing::debug;

use super::connection::Database;
use super::schema::STUDENTS_TABLE;
use crate::error::{StoreError, WriteOutcome};
use crate::models::Student;

/// Persists and queries student records in the `students` table.
///
/// Each call opens its own connection and runs a single statement. Nothing
/// here spans a transaction, so a list followed by an update can act on a
/// row another process has changed in the meantime.
#[derive(Debug, Clone)]
pub struct StudentRecordStore {
    db: Database,
}

impl StudentRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create the `students` table if it does not exist yet.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        let conn = self.db.connect()?;
        conn.execute(STUDENTS_TABLE, [])
            .map_err(StoreError::statement("create students table"))?;
        Ok(())
    }

    /// Every record in insertion order. AUTOINCREMENT ids only grow, so
    /// ordering by id is the same as ordering by insertion.
    pub fn list_all(&self) -> Result<Vec<Student>, StoreError> {
        let conn = self.db.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, studentNumber, firstName, lastName, program, level
                 FROM students
                 ORDER BY id",
            )
            .map_err(StoreError::statement("prepare student query"))?;

        let students = stmt
            .query_map([], student_from_row)
            .map_err(StoreError::statement("load students"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::statement("collect students"))?;

        debug!(count = students.len(), "listed students");
        Ok(students)
    }

    /// Persist every field except `id` and return the record with the id
    /// SQLite assigned.
    pub fn insert(&self, student: &Student) -> Result<Student, StoreError> {
        let conn = self.db.connect()?;
        conn.execute(
            "INSERT INTO students (studentNumber, firstName, lastName, program, level)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                student.student_number,
                student.first_name,
                student.last_name,
                student.program,
                student.level
            ],
        )
        .map_err(StoreError::statement("insert student"))?;

        let id = conn.last_insert_rowid();
        debug!(id, student_number = %student.student_number, "inserted student");
        Ok(Student {
            id,
            ..student.clone()
        })
    }

    /// Replace every non-id column of the row with `student.id`.
    pub fn update(&self, student: &Student) -> Result<WriteOutcome, StoreError> {
        let conn = self.db.connect()?;
        let updated = conn
            .execute(
                "UPDATE students
                 SET studentNumber = ?1, firstName = ?2, lastName = ?3, program = ?4, level = ?5
                 WHERE id = ?6",
                params![
                    student.student_number,
                    student.first_name,
                    student.last_name,
                    student.program,
                    student.level,
                    student.id
                ],
            )
            .map_err(StoreError::statement("update student"))?;

        let outcome = WriteOutcome::from_rows(updated);
        debug!(id = student.id, ?outcome, "updated student");
        Ok(outcome)
    }

    /// Remove the row with `id`, if there is one.
    pub fn delete(&self, id: i64) -> Result<WriteOutcome, StoreError> {
        let conn = self.db.connect()?;
        let deleted = conn
            .execute("DELETE FROM students WHERE id = ?1", params![id])
            .map_err(StoreError::statement("delete student"))?;

        let outcome = WriteOutcome::from_rows(deleted);
        debug!(id, ?outcome, "deleted student");
        Ok(outcome)
    }
}

/// The columns are nullable and untyped, so rows written by other tools may
/// carry NULLs or values of the wrong type. Text columns fall back to an
/// empty string and `level` to 0 instead of failing the whole listing.
fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        student_number: text_column(row.get_ref(1)?),
        first_name: text_column(row.get_ref(2)?),
        last_name: text_column(row.get_ref(3)?),
        program: text_column(row.get_ref(4)?),
        level: level_column(row.get_ref(5)?),
    })
}

fn text_column(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Integer(n) => n.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Null | ValueRef::Blob(_) => String::new(),
    }
}

fn level_column(value: ValueRef<'_>) -> i64 {
    match value {
        ValueRef::Integer(n) => n,
        _ => 0,
    }
}
