//! maildb - administration of the SQLite database shared by Postfix and Dovecot
//!
//! Postfix reads its lookup tables and Dovecot its passdb/userdb out of one
//! SQLite file through read-only views. This crate owns the tables behind
//! those views and keeps them consistent.
//!
//! # Architecture
//!
//! - **db**: Schema creation, opening and the transaction scope
//! - **repo**: Repositories for access rules, transports, domains, addresses,
//!   aliases and mailboxes
//! - **maps**: Import and export of the text map files each entity lives in
//! - **mail**: Address and alias-recipient decoding
//! - **config**: YAML configuration (database path, busy timeout, log level)
//! - **logging**: tracing subscriber setup
//!
//! ```no_run
//! use maildb::Database;
//!
//! # fn main() -> maildb::Result<()> {
//! let db = Database::open("/etc/postfix/private/mail.db")?;
//! db.transaction(|db| {
//!     db.aliases().make_alias("postmaster", &["root"])?;
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod mail;
pub mod maps;
pub mod repo;

// Re-exports
pub use db::Database;
pub use error::{Entity, MailDbError, Result};
