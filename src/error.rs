//! Error types for maildb
//!
//! One enum covers every failure the core can report. Repository code maps
//! SQLite constraint failures into the specific kinds below before they
//! reach the caller.

use crate::mail::AddressError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for maildb operations
pub type Result<T> = std::result::Result<T, MailDbError>;

/// The kind of row an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Domain,
    Access,
    Transport,
    Address,
    Alias,
    Mailbox,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Domain => "domain",
            Entity::Access => "access rule",
            Entity::Transport => "transport",
            Entity::Address => "address",
            Entity::Alias => "alias",
            Entity::Mailbox => "mailbox",
        };
        f.write_str(name)
    }
}

/// Errors reported by the database core
#[derive(Error, Debug)]
pub enum MailDbError {
    #[error("{entity} not found: {name}")]
    NotFound { entity: Entity, name: String },

    #[error("{entity} already exists: {name}")]
    Duplicate { entity: Entity, name: String },

    #[error("bad {entity} name '{name}': {reason}")]
    BadName {
        entity: Entity,
        name: String,
        reason: String,
    },

    #[error("bad value: {0}")]
    BadValue(String),

    #[error("bad domain class: {0}")]
    BadClass(String),

    #[error("bad access action: {0}")]
    BadAction(String),

    #[error("bad password type: {0}")]
    BadPasswordType(String),

    /// Row is still referenced and cannot be removed
    #[error("{entity} {name} is busy: still referenced")]
    Busy { entity: Entity, name: String },

    #[error("{0} is an alias")]
    IsAlias(String),

    #[error("{0} is not an alias")]
    NotAlias(String),

    #[error("alias {0} has no recipients")]
    NoRecipients(String),

    #[error("recipient {recipient} not found in alias {alias}")]
    RecipientNotFound { alias: String, recipient: String },

    #[error("mailbox {0} is not in a vmailbox domain")]
    MboxNotMboxDomain(String),

    #[error("mailbox {0} is an alias")]
    MboxIsAlias(String),

    #[error("mailbox {0} is the recipient of an alias")]
    MboxIsRecipient(String),

    /// Virtual aliases may only point at addresses
    #[error("alias {alias} cannot have target '{target}'")]
    AddressTarget { alias: String, target: String },

    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    #[error("not in a transaction")]
    NotInTransaction,

    #[error("nothing found to import")]
    ImportEmpty,

    #[error("import syntax error at line {line}: {message}")]
    ImportSyntax { line: usize, message: String },

    #[error("import failed at line {line}: {source}")]
    ImportRecord {
        line: usize,
        #[source]
        source: Box<MailDbError>,
    },

    #[error("database already exists: {}", .0.display())]
    DatabaseExists(PathBuf),

    #[error("database does not exist: {} (run 'maildb create' first)", .0.display())]
    NoDatabase(PathBuf),

    #[error("not a maildb database: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl MailDbError {
    pub(crate) fn not_found(entity: Entity, name: impl Into<String>) -> Self {
        MailDbError::NotFound {
            entity,
            name: name.into(),
        }
    }

    pub(crate) fn duplicate(entity: Entity, name: impl Into<String>) -> Self {
        MailDbError::Duplicate {
            entity,
            name: name.into(),
        }
    }

    pub(crate) fn busy(entity: Entity, name: impl Into<String>) -> Self {
        MailDbError::Busy {
            entity,
            name: name.into(),
        }
    }

    pub(crate) fn bad_name(entity: Entity, name: impl Into<String>, reason: impl Into<String>) -> Self {
        MailDbError::BadName {
            entity,
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a not-found of any entity
    pub fn is_not_found(&self) -> bool {
        matches!(self, MailDbError::NotFound { .. })
    }

    /// The innermost error, looking through import line wrappers
    pub fn root(&self) -> &MailDbError {
        match self {
            MailDbError::ImportRecord { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<mapfile::Error<MailDbError>> for MailDbError {
    fn from(err: mapfile::Error<MailDbError>) -> Self {
        match err {
            mapfile::Error::Io(e) => MailDbError::Io(e),
            mapfile::Error::Syntax { line, message } => MailDbError::ImportSyntax { line, message },
            mapfile::Error::Empty => MailDbError::ImportEmpty,
            mapfile::Error::Record { line, source } => MailDbError::ImportRecord {
                line,
                source: Box::new(source),
            },
        }
    }
}
