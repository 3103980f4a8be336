//! Transports: named `method:nexthop` delivery choices

use super::{check_name, non_empty, text_value, unknown_field, Handle, Pattern};
use crate::db::{translate, Constraint, Database};
use crate::error::Entity;
use crate::{MailDbError, Result};
use mapfile::Syntax;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transport {
    pub name: String,
    pub transport: Option<String>,
    pub nexthop: Option<String>,
}

impl Transport {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<(i64, Self)> {
        Ok((
            row.get(0)?,
            Self {
                name: row.get(1)?,
                transport: row.get(2)?,
                nexthop: row.get(3)?,
            },
        ))
    }

    /// `transport:nexthop` with empty sides for unset fields
    pub fn spec(&self) -> String {
        format!(
            "{}:{}",
            self.transport.as_deref().unwrap_or_default(),
            self.nexthop.as_deref().unwrap_or_default()
        )
    }

    pub fn to_line(&self) -> String {
        Syntax::Simple.format(&self.name, &[self.spec()])
    }

    /// Split a `transport:nexthop` value on its first `:`
    ///
    /// The nexthop may itself contain colons (`smtp:[mx.example.com]:25`).
    pub fn parse_spec(value: &str) -> Result<(Option<String>, Option<String>)> {
        match value.trim().split_once(':') {
            Some((transport, nexthop)) => Ok((
                non_empty(transport).map(str::to_string),
                non_empty(nexthop).map(str::to_string),
            )),
            None => Err(MailDbError::BadValue(format!(
                "transport '{}' must include ':'",
                value.trim()
            ))),
        }
    }
}

/// The delivery method is everything before the first `:` of the exported
/// spec, so it may not contain one itself
fn check_method(value: &str) -> Result<Option<String>> {
    let method = text_value("transport", value)?;
    if let Some(m) = method.as_deref().filter(|m| m.contains(':')) {
        return Err(MailDbError::BadValue(format!(
            "transport may not contain ':': '{}'",
            m
        )));
    }
    Ok(method)
}

#[derive(Debug)]
pub struct Transports<'db> {
    db: &'db Database,
}

impl<'db> Transports<'db> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self { db }
    }

    fn fetch(&self, name: &str) -> Result<(i64, Transport)> {
        self.db
            .conn()
            .query_row(
                "SELECT id, name, transport, nexthop FROM transport WHERE name = ?1",
                [name.trim()],
                Transport::from_row,
            )
            .optional()?
            .ok_or_else(|| MailDbError::not_found(Entity::Transport, name.trim()))
    }

    pub fn lookup(&self, name: &str) -> Result<Transport> {
        tracing::debug!(transport = %name, "Looking up transport");
        Ok(self.fetch(name)?.1)
    }

    pub fn find(&self, pattern: &str) -> Result<Vec<Transport>> {
        let pattern = Pattern::new(pattern);
        let sql = format!(
            "SELECT id, name, transport, nexthop FROM transport WHERE {} ORDER BY name",
            pattern.condition("name", 1)
        );
        let mut stmt = self.db.conn().prepare(&sql)?;
        let found = stmt
            .query_map([pattern.value()], Transport::from_row)?
            .map(|r| r.map(|(_, t)| t))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        pattern.finish(Entity::Transport, found)
    }

    pub fn get(&self, name: &str) -> Result<TransportEditor<'db>> {
        let (id, transport) = self.fetch(name)?;
        Ok(TransportEditor {
            handle: Handle::new(self.db, id)?,
            transport,
        })
    }

    /// Create a transport; empty fields are stored unset
    pub fn insert(
        &self,
        name: &str,
        transport: &str,
        nexthop: &str,
    ) -> Result<TransportEditor<'db>> {
        self.db.generation()?;
        let name = check_name(Entity::Transport, name)?;
        let transport = check_method(transport)?;
        let nexthop = text_value("nexthop", nexthop)?;

        self.db
            .conn()
            .execute(
                "INSERT INTO transport (name, transport, nexthop) VALUES (?1, ?2, ?3)",
                params![name, transport, nexthop],
            )
            .map_err(|e| {
                translate(e, |c| {
                    (*c == Constraint::Unique)
                        .then(|| MailDbError::duplicate(Entity::Transport, &name))
                })
            })?;

        let record = Transport {
            name,
            transport,
            nexthop,
        };
        tracing::info!(transport = %record.name, spec = %record.spec(), "Transport created");
        Ok(TransportEditor {
            handle: Handle::new(self.db, self.db.conn().last_insert_rowid())?,
            transport: record,
        })
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        self.db.generation()?;
        let (id, transport) = self.fetch(name)?;
        self.db
            .conn()
            .execute("DELETE FROM transport WHERE id = ?1", [id])
            .map_err(|e| {
                translate(e, |c| {
                    (*c == Constraint::ForeignKey)
                        .then(|| MailDbError::busy(Entity::Transport, &transport.name))
                })
            })?;
        tracing::info!(transport = %transport.name, "Transport deleted");
        Ok(())
    }

    pub fn export(&self) -> Result<Vec<String>> {
        Ok(self.find("*")?.iter().map(Transport::to_line).collect())
    }
}

#[derive(Debug)]
pub struct TransportEditor<'db> {
    handle: Handle<'db>,
    transport: Transport,
}

impl TransportEditor<'_> {
    pub fn record(&self) -> &Transport {
        &self.transport
    }

    /// Set the delivery method, empty to clear
    pub fn set_transport(&mut self, value: &str) -> Result<()> {
        let conn = self.handle.conn()?;
        let value = check_method(value)?;
        conn.execute(
            "UPDATE transport SET transport = ?1 WHERE id = ?2",
            params![value, self.handle.id()],
        )?;
        self.transport.transport = value;
        tracing::info!(transport = %self.transport.name, spec = %self.transport.spec(), "Transport changed");
        Ok(())
    }

    /// Set the nexthop, empty to clear
    pub fn set_nexthop(&mut self, value: &str) -> Result<()> {
        let conn = self.handle.conn()?;
        let value = text_value("nexthop", value)?;
        conn.execute(
            "UPDATE transport SET nexthop = ?1 WHERE id = ?2",
            params![value, self.handle.id()],
        )?;
        self.transport.nexthop = value;
        tracing::info!(transport = %self.transport.name, spec = %self.transport.spec(), "Transport changed");
        Ok(())
    }

    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "transport" => self.set_transport(value),
            "nexthop" => self.set_nexthop(value),
            _ => Err(unknown_field(Entity::Transport, key)),
        }
    }
}
