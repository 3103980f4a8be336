//! maildb configuration file handling

use crate::db::OpenOptions;
use crate::{MailDbError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where Postfix keeps its private lookup tables
pub const DEFAULT_DATABASE: &str = "/etc/postfix/private/mail.db";

fn default_database() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE)
}

fn default_busy_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// maildb configuration
///
/// Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailDbConfig {
    /// Database file used when `--db` and `MAILDB_DB` are not given
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Seconds to wait for a lock held by another process
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,

    /// Log filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl MailDbConfig {
    pub fn new() -> Self {
        Self {
            database: default_database(),
            busy_timeout_secs: default_busy_timeout(),
            log_level: default_log_level(),
        }
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(MailDbError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), "Loading maildb configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            database = %config.database.display(),
            busy_timeout_secs = config.busy_timeout_secs,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Load an explicitly named file, or the default file if there is one
    ///
    /// A missing default file yields the built-in defaults; a missing named
    /// file is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load(&path)
                } else {
                    Ok(Self::new())
                }
            }
        }
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving maildb configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (`<config_dir>/maildb/config.yaml`)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("maildb");
        path.push("config.yaml");
        path
    }

    /// The database to use, `explicit` taking precedence
    pub fn database_path(&self, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.database.clone())
    }

    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            busy_timeout: Duration::from_secs(self.busy_timeout_secs),
        }
    }
}

impl Default for MailDbConfig {
    fn default() -> Self {
        Self::new()
    }
}
