//! Runtime settings. Only file locations and log verbosity are configurable;
//! everything else is fixed behavior.

use std::path::PathBuf;

use directories::BaseDirs;
use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".student-records";
/// Used when no home directory can be resolved.
const FALLBACK_DATA_DIR: &str = "data";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "students.sqlite";
const LOG_FILE_NAME: &str = "student-records.log";
/// Prefix for environment overrides, e.g. `STUDENT_RECORDS_DATABASE_PATH`.
pub const ENV_PREFIX: &str = "STUDENT_RECORDS_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub database_path: PathBuf,
    /// The TUI owns stdout, so logs always go to a file.
    pub log_path: PathBuf,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub loglevel: String,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = data_dir();
        Self {
            database_path: data_dir.join(DB_FILE_NAME),
            log_path: data_dir.join(LOG_FILE_NAME),
            loglevel: "info".to_string(),
        }
    }
}

impl Settings {
    /// Layer environment overrides on top of the defaults.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
    }
}

fn data_dir() -> PathBuf {
    match BaseDirs::new() {
        Some(base_dirs) => base_dirs.home_dir().join(DATA_DIR_NAME),
        None => PathBuf::from(FALLBACK_DATA_DIR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_share_one_data_directory() {
        let settings = Settings::default();
        assert_eq!(settings.database_path.parent(), settings.log_path.parent());
        assert!(settings.database_path.ends_with(DB_FILE_NAME));
        assert_eq!(settings.loglevel, "info");
    }

    #[test]
    fn environment_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("STUDENT_RECORDS_DATABASE_PATH", "/tmp/records/school.sqlite");
            jail.set_env("STUDENT_RECORDS_LOGLEVEL", "debug");

            let settings = Settings::load()?;
            assert_eq!(
                settings.database_path,
                PathBuf::from("/tmp/records/school.sqlite")
            );
            assert_eq!(settings.loglevel, "debug");
            assert_eq!(settings.log_path, Settings::default().log_path);
            Ok(())
        });
    }
}
