//! Entity repositories
//!
//! Each repository borrows the [`Database`] and offers the same vocabulary:
//! `lookup`, `find`, `get`, `insert`, `delete` and `export`. `get` and
//! `insert` return an editor whose setters persist one field at a time and
//! only work while the scope they were created in is open.

mod access;
mod address;
mod alias;
mod domain;
mod mailbox;
mod transport;

pub use access::{AccessEditor, AccessRule, AccessRules};
pub use address::{Address, AddressEditor, Addresses};
pub use alias::{Alias, AliasKind, Aliases};
pub use domain::{Domain, DomainClass, DomainEditor, Domains};
pub use mailbox::{Mailbox, MailboxEditor, Mailboxes, PasswordType, DEFAULT_QUOTA};
pub use transport::{Transport, TransportEditor, Transports};

use crate::db::Database;
use crate::error::Entity;
use crate::{MailDbError, Result};
use rusqlite::{Connection, OptionalExtension};

impl Database {
    pub fn access(&self) -> AccessRules<'_> {
        AccessRules::new(self)
    }

    pub fn transports(&self) -> Transports<'_> {
        Transports::new(self)
    }

    pub fn domains(&self) -> Domains<'_> {
        Domains::new(self)
    }

    pub fn addresses(&self) -> Addresses<'_> {
        Addresses::new(self)
    }

    pub fn aliases(&self) -> Aliases<'_> {
        Aliases::new(self)
    }

    pub fn mailboxes(&self) -> Mailboxes<'_> {
        Mailboxes::new(self)
    }
}

/// A row id tied to the scope it was fetched in
#[derive(Debug, Clone, Copy)]
pub(crate) struct Handle<'db> {
    db: &'db Database,
    id: i64,
    generation: u64,
}

impl<'db> Handle<'db> {
    /// Bind `id` to the open scope
    pub(crate) fn new(db: &'db Database, id: i64) -> Result<Self> {
        Ok(Self {
            db,
            id,
            generation: db.generation()?,
        })
    }

    pub(crate) fn id(&self) -> i64 {
        self.id
    }

    /// The connection, if the handle's scope is still open
    pub(crate) fn conn(&self) -> Result<&'db Connection> {
        self.db.check_generation(self.generation)?;
        Ok(self.db.conn())
    }
}

/// A name filter for `find`
///
/// A pattern containing `*` becomes an SQL `LIKE` with `*` as the wildcard;
/// anything else is an exact match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Pattern {
    value: String,
    wildcard: bool,
}

impl Pattern {
    pub(crate) fn new(pattern: &str) -> Self {
        let pattern = pattern.trim();
        if !pattern.contains('*') {
            return Self {
                value: pattern.to_string(),
                wildcard: false,
            };
        }

        let mut value = String::with_capacity(pattern.len());
        for c in pattern.chars() {
            match c {
                '*' => value.push('%'),
                '%' | '_' | '\\' => {
                    value.push('\\');
                    value.push(c);
                }
                _ => value.push(c),
            }
        }
        Self {
            value,
            wildcard: true,
        }
    }

    /// Lowercased, for names stored in lower case
    pub(crate) fn lowercase(pattern: &str) -> Self {
        Self::new(&pattern.to_lowercase())
    }

    /// SQL condition comparing `column` with parameter `?N`
    pub(crate) fn condition(&self, column: &str, param: usize) -> String {
        if self.wildcard {
            format!("{} LIKE ?{} ESCAPE '\\'", column, param)
        } else {
            format!("{} = ?{}", column, param)
        }
    }

    pub(crate) fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Empty exact matches are a not-found; empty wildcard matches are not
    pub(crate) fn finish<T>(&self, entity: Entity, found: Vec<T>) -> Result<Vec<T>> {
        if found.is_empty() && !self.is_wildcard() {
            return Err(MailDbError::not_found(entity, self.value.clone()));
        }
        Ok(found)
    }
}

/// Characters never allowed in access, transport or domain names
const NAME_ILLEGAL: &[char] = &['#', ',', ':', '"', ';', '{', '}', '(', ')', '[', ']', '@'];

/// Check a plain entity name, returning it trimmed
pub(crate) fn check_name(entity: Entity, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(MailDbError::bad_name(entity, name, "empty name"));
    }
    if name.contains(char::is_whitespace) {
        return Err(MailDbError::bad_name(entity, name, "contains whitespace"));
    }
    if name.contains(NAME_ILLEGAL) {
        return Err(MailDbError::bad_name(entity, name, "contains illegal characters"));
    }
    Ok(name.to_string())
}

/// Split a `key=value` assignment
pub fn parse_assignment(text: &str) -> Result<(String, String)> {
    match text.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_lowercase(), value.trim().to_string()))
        }
        _ => Err(MailDbError::BadValue(format!(
            "expected key=value, got '{}'",
            text
        ))),
    }
}

/// An empty string clears a field
pub(crate) fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Starts a comment in every map file, so no exported value may hold it
pub(crate) const COMMENT: char = '#';

/// An optional free-text field; empty clears it
pub(crate) fn text_value(field: &str, value: &str) -> Result<Option<String>> {
    match non_empty(value) {
        Some(v) if v.contains(COMMENT) => Err(MailDbError::BadValue(format!(
            "{} may not contain '#': '{}'",
            field, v
        ))),
        other => Ok(other.map(str::to_string)),
    }
}

/// An optional field exported as a single `key=value` option
pub(crate) fn option_value(field: &str, value: &str) -> Result<Option<String>> {
    match non_empty(value) {
        Some(v) if v.contains([COMMENT, ',']) || v.contains(char::is_whitespace) => {
            Err(MailDbError::BadValue(format!(
                "{} may not contain ',', '#' or whitespace: '{}'",
                field, v
            )))
        }
        other => Ok(other.map(str::to_string)),
    }
}

/// Parse an optional numeric id such as a uid or gid
pub(crate) fn parse_id(field: &str, value: &str) -> Result<Option<i64>> {
    match non_empty(value) {
        None => Ok(None),
        Some(v) => v
            .parse::<i64>()
            .ok()
            .filter(|n| *n >= 0)
            .map(Some)
            .ok_or_else(|| MailDbError::BadValue(format!("{} must be a number: '{}'", field, v))),
    }
}

pub(crate) fn unknown_field(entity: Entity, key: &str) -> MailDbError {
    MailDbError::BadValue(format!("unknown {} field '{}'", entity, key))
}

/// Id of an access rule by name
pub(crate) fn access_id(conn: &Connection, name: &str) -> Result<i64> {
    conn.query_row("SELECT id FROM access WHERE name = ?1", [name], |row| {
        row.get(0)
    })
    .optional()?
    .ok_or_else(|| MailDbError::not_found(Entity::Access, name))
}

/// Id of a transport by name
pub(crate) fn transport_id(conn: &Connection, name: &str) -> Result<i64> {
    conn.query_row("SELECT id FROM transport WHERE name = ?1", [name], |row| {
        row.get(0)
    })
    .optional()?
    .ok_or_else(|| MailDbError::not_found(Entity::Transport, name))
}

/// Format `key=value` options, skipping unset fields
pub(crate) fn options(fields: &[(&str, Option<String>)]) -> Vec<String> {
    fields
        .iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| format!("{}={}", key, v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_pattern() {
        let p = Pattern::new("example.com");
        assert!(!p.is_wildcard());
        assert_eq!(p.condition("name", 1), "name = ?1");
        assert_eq!(p.value(), "example.com");
    }

    #[test]
    fn test_wildcard_pattern() {
        let p = Pattern::new("*.example_1.com");
        assert!(p.is_wildcard());
        assert_eq!(p.condition("name", 2), "name LIKE ?2 ESCAPE '\\'");
        assert_eq!(p.value(), "%.example\\_1.com");

        assert_eq!(Pattern::new("*").value(), "%");
    }

    #[test]
    fn test_pattern_finish() {
        let empty: Vec<i32> = Vec::new();
        assert!(Pattern::new("*").finish(Entity::Domain, empty.clone()).is_ok());
        let err = Pattern::new("x").finish(Entity::Domain, empty).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_check_name() {
        assert_eq!(check_name(Entity::Access, " spam ").unwrap(), "spam");
        assert!(check_name(Entity::Access, "").is_err());
        assert!(check_name(Entity::Access, "two words").is_err());
        assert!(check_name(Entity::Transport, "a:b").is_err());
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("RClass=STALL").unwrap(),
            ("rclass".to_string(), "STALL".to_string())
        );
        assert_eq!(
            parse_assignment("transport=").unwrap(),
            ("transport".to_string(), String::new())
        );
        assert!(parse_assignment("transport").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_field_values() {
        assert_eq!(text_value("nexthop", " [mx]:25 ").unwrap().as_deref(), Some("[mx]:25"));
        assert_eq!(text_value("nexthop", "").unwrap(), None);
        assert!(matches!(text_value("nexthop", "mx#2"), Err(MailDbError::BadValue(_))));

        assert_eq!(option_value("rclass", "STALL").unwrap().as_deref(), Some("STALL"));
        for bad in ["A,B", "A B", "A#1"] {
            assert!(option_value("rclass", bad).is_err(), "accepted {}", bad);
        }
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("uid", "42").unwrap(), Some(42));
        assert_eq!(parse_id("uid", "").unwrap(), None);
        assert!(parse_id("uid", "-1").is_err());
        assert!(parse_id("uid", "abc").is_err());
    }
}
