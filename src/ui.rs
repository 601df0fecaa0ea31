//! Ratatui front-end: a login/signup screen and the student table, both
//! driven by [`App`] and the crossterm event loop in [`run_app`].

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
