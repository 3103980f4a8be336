//! Configuration system
//!
//! Loads `<config_dir>/maildb/config.yaml`, or a file named on the command
//! line, to supply the database path, busy timeout and log level.

mod maildb_config;

pub use maildb_config::{MailDbConfig, DEFAULT_DATABASE};
