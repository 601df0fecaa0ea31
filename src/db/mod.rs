//! Persistence module split across logical submodules.

mod admins;
mod connection;
mod schema;
mod students;

pub use admins::AdminAccountStore;
pub use connection::Database;
pub use students::StudentRecordStore;
