//! Core library surface for the student records manager.
//!
//! The stores are usable on their own; the `ui` module is the only caller in
//! the shipped binary.
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod ui;

/// Persistence layer: one handle naming the SQLite file, one store per table.
pub use db::{AdminAccountStore, Database, StudentRecordStore};

pub use config::Settings;
pub use error::{StoreError, WriteOutcome};
pub use models::{AdminAccount, Student};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
