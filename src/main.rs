//! Binary entry point: load settings, start file logging, make sure both
//! tables exist, then hand control to the Ratatui event loop.
use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::Context;
use student_records::{run_app, AdminAccountStore, App, Database, Settings, StudentRecordStore};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load().context("failed to load settings")?;
    init_tracing(&settings)?;
    info!(
        database = %settings.database_path.display(),
        loglevel = %settings.loglevel,
        "starting student records manager"
    );

    let db = Database::new(&settings.database_path);
    let admin_store = AdminAccountStore::new(db.clone());
    let student_store = StudentRecordStore::new(db);

    // A store that cannot create its table behaves like an empty one; the
    // screens report the failures as they happen.
    if let Err(err) = admin_store.ensure_schema() {
        error!(error = %err, "failed to prepare admins table");
    }
    if let Err(err) = student_store.ensure_schema() {
        error!(error = %err, "failed to prepare students table");
    }

    let mut app = App::new(admin_store, student_store);
    let result = run_app(&mut app);
    info!("exiting");
    result
}

/// Log to a file; the terminal UI owns stdout.
fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    if let Some(parent) = settings.log_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("failed to create log directory")?;
        }
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_path)
        .with_context(|| format!("failed to open log file {}", settings.log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(log_file))
                .with_ansi(false)
                .with_target(false),
        )
        .init();
    Ok(())
}
