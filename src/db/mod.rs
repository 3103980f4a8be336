//! SQLite database handle
//!
//! The schema in `schema.sql` is the contract with the mail daemons. This
//! module creates and opens database files, owns the single connection,
//! and classifies constraint failures so repositories can report them as
//! domain errors.

mod scope;

pub use scope::Scope;
pub(crate) use scope::ScopeState;

use crate::{MailDbError, Result};
use chrono::Utc;
use rusqlite::{ffi, params, Connection, ErrorCode, OpenFlags, OptionalExtension};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::Duration;

static SCHEMA: &str = include_str!("schema.sql");

/// Version recorded in the `meta` table by [`Database::create`]
pub const SCHEMA_VERSION: u32 = 1;

/// Messages raised by the schema triggers
pub(crate) mod raise {
    pub const ADDRESS_EXISTS: &str = "address exists";
    pub const VIRTUAL_TARGET: &str = "virtual alias target must be an address";
    pub const ALIAS_IS_MAILBOX: &str = "alias source is a mailbox";
    pub const NOT_VMAILBOX_DOMAIN: &str = "mailbox domain is not a vmailbox domain";
    pub const MAILBOX_IS_ALIAS: &str = "mailbox address is an alias";
    pub const DOMAIN_HOLDS_MAILBOXES: &str = "domain holds mailboxes";
    pub const DOMAIN_HAS_RECIPIENTS: &str = "domain addresses are alias targets";
    pub const DOMAIN_HAS_ALIASES: &str = "domain has virtual aliases";
}

/// Connection settings
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// How long to wait for another process holding the write lock
    pub busy_timeout: Duration,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// A handle on a maildb database file
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
    pub(crate) scope: Cell<ScopeState>,
}

impl Database {
    /// Create a new database file holding an empty schema
    ///
    /// The schema is built in a temporary file beside `path` and moved into
    /// place only once complete. An existing file is never overwritten.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_with_options(path, &OpenOptions::default())
    }

    /// Create a new database file with explicit connection settings
    pub fn create_with_options(path: impl AsRef<Path>, options: &OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(MailDbError::DatabaseExists(path.to_path_buf()));
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        tracing::info!(path = %path.display(), "Creating database");

        let staged = tempfile::Builder::new()
            .prefix(".maildb-")
            .suffix(".db")
            .tempfile_in(dir)?;
        {
            let mut conn = Connection::open(staged.path())?;
            load_schema(&mut conn)?;
        }

        staged.persist_noclobber(path).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                MailDbError::DatabaseExists(path.to_path_buf())
            } else {
                MailDbError::Io(e.error)
            }
        })?;

        Self::open_with_options(path, options)
    }

    /// Open an existing database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, &OpenOptions::default())
    }

    /// Open an existing database file with explicit connection settings
    pub fn open_with_options(path: impl AsRef<Path>, options: &OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MailDbError::NoDatabase(path.to_path_buf()));
        }

        tracing::debug!(path = %path.display(), "Opening database");

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(options.busy_timeout)?;

        let db = Self::from_connection(conn, Some(path.to_path_buf()))?;
        db.check_schema()?;
        Ok(db)
    }

    /// Create a private in-memory database with the schema loaded
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        load_schema(&mut conn)?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self {
            conn,
            path,
            scope: Cell::new(ScopeState::default()),
        })
    }

    fn check_schema(&self) -> Result<()> {
        let version: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|_| MailDbError::Schema("missing meta table".to_string()))?;

        match version {
            Some(v) if v == SCHEMA_VERSION.to_string() => Ok(()),
            Some(v) => Err(MailDbError::Schema(format!(
                "schema version {} is not supported (expected {})",
                v, SCHEMA_VERSION
            ))),
            None => Err(MailDbError::Schema("no schema version".to_string())),
        }
    }

    /// Path of the database file, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// When the schema was created, as recorded in the `meta` table
    pub fn created(&self) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM meta WHERE key = 'created'", [], |row| {
                row.get(0)
            })
            .optional()?)
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn load_schema(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA)?;
    tx.execute(
        "INSERT INTO meta (key, value) VALUES ('schema_version', ?1), ('created', ?2)",
        params![SCHEMA_VERSION.to_string(), Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;
    Ok(())
}

/// The kind of constraint a failed statement ran into
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Constraint {
    Unique,
    ForeignKey,
    Check,
    /// `RAISE` from a trigger, with its message
    Trigger(String),
    Other,
}

pub(crate) fn constraint(err: &rusqlite::Error) -> Option<Constraint> {
    match err {
        rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
            Some(match e.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    Constraint::Unique
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Constraint::ForeignKey,
                ffi::SQLITE_CONSTRAINT_CHECK => Constraint::Check,
                ffi::SQLITE_CONSTRAINT_TRIGGER => {
                    Constraint::Trigger(msg.clone().unwrap_or_default())
                }
                _ => Constraint::Other,
            })
        }
        _ => None,
    }
}

/// Translate a failed statement, letting `classify` name constraint failures
///
/// Anything `classify` declines stays a plain database error.
pub(crate) fn translate<F>(err: rusqlite::Error, classify: F) -> MailDbError
where
    F: FnOnce(&Constraint) -> Option<MailDbError>,
{
    match constraint(&err).as_ref().and_then(classify) {
        Some(mapped) => mapped,
        None => MailDbError::Database(err),
    }
}
