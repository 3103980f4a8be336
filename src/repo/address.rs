//! Addresses and their per-address overrides

use super::domain::ensure_domain;
use super::{access_id, non_empty, option_value, options, transport_id, unknown_field, Handle, Pattern};
use crate::db::{raise, translate, Constraint, Database};
use crate::error::Entity;
use crate::mail::{decode_address, AddressParts};
use crate::{MailDbError, Result};
use mapfile::Syntax;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    /// The address as written, `localpart[@domain]`
    pub address: String,
    pub localpart: String,
    pub domain: Option<String>,
    pub transport: Option<String>,
    pub access: Option<String>,
    pub rclass: Option<String>,
}

const SELECT: &str = "SELECT a.id, a.localpart, d.name, t.name, ac.name, a.rclass
                        FROM address a
                        LEFT JOIN domain d ON d.id = a.domain
                        LEFT JOIN transport t ON t.id = a.transport
                        LEFT JOIN access ac ON ac.id = a.access";

/// SQL rendering of an address, matching [`Address::address`]
pub(crate) const ADDRESS_SQL: &str = "a.localpart || coalesce('@' || d.name, '')";

impl Address {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<(i64, Self)> {
        let localpart: String = row.get(1)?;
        let domain: Option<String> = row.get(2)?;
        Ok((
            row.get(0)?,
            Self {
                address: render(&localpart, domain.as_deref()),
                localpart,
                domain,
                transport: row.get(3)?,
                access: row.get(4)?,
                rclass: row.get(5)?,
            },
        ))
    }

    /// `address[ key=value, ...]`
    pub fn to_line(&self) -> String {
        Syntax::Postfix.format(
            &self.address,
            &options(&[
                ("transport", self.transport.clone()),
                ("access", self.access.clone()),
                ("rclass", self.rclass.clone()),
            ]),
        )
    }
}

pub(crate) fn render(localpart: &str, domain: Option<&str>) -> String {
    match domain {
        Some(domain) => format!("{}@{}", localpart, domain),
        None => localpart.to_string(),
    }
}

/// Id of the address with these parts, if it exists
pub(crate) fn resolve(conn: &Connection, parts: &AddressParts) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT a.id FROM address a LEFT JOIN domain d ON d.id = a.domain
              WHERE a.localpart = ?1 AND d.name IS ?2",
            params![parts.mailbox(), parts.domain],
            |row| row.get(0),
        )
        .optional()?)
}

/// Id of the address, creating it and its domain if needed
pub(crate) fn ensure_address(conn: &Connection, parts: &AddressParts) -> Result<i64> {
    if let Some(id) = resolve(conn, parts)? {
        return Ok(id);
    }
    create(conn, parts)
}

fn create(conn: &Connection, parts: &AddressParts) -> Result<i64> {
    let domain = parts
        .domain
        .as_deref()
        .map(|name| ensure_domain(conn, name))
        .transpose()?;

    conn.execute(
        "INSERT INTO address (localpart, domain) VALUES (?1, ?2)",
        params![parts.mailbox(), domain],
    )
    .map_err(|e| {
        translate(e, |c| match c {
            Constraint::Unique => Some(MailDbError::duplicate(Entity::Address, parts.to_string())),
            Constraint::Trigger(msg) if msg == raise::ADDRESS_EXISTS => {
                Some(MailDbError::duplicate(Entity::Address, parts.to_string()))
            }
            _ => None,
        })
    })?;
    tracing::debug!(address = %parts, "Address row created");
    Ok(conn.last_insert_rowid())
}

#[derive(Debug)]
pub struct Addresses<'db> {
    db: &'db Database,
}

impl<'db> Addresses<'db> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self { db }
    }

    fn fetch(&self, address: &str) -> Result<(i64, Address)> {
        let parts = decode_address(address)?;
        self.db
            .conn()
            .query_row(
                &format!("{} WHERE a.localpart = ?1 AND d.name IS ?2", SELECT),
                params![parts.mailbox(), parts.domain],
                Address::from_row,
            )
            .optional()?
            .ok_or_else(|| MailDbError::not_found(Entity::Address, parts.to_string()))
    }

    pub fn lookup(&self, address: &str) -> Result<Address> {
        tracing::debug!(address = %address, "Looking up address");
        Ok(self.fetch(address)?.1)
    }

    /// Addresses whose `localpart[@domain]` matches the pattern
    pub fn find(&self, pattern: &str) -> Result<Vec<Address>> {
        let pattern = Pattern::lowercase(pattern);
        let sql = format!(
            "{} WHERE {} ORDER BY coalesce(d.name, ''), a.localpart",
            SELECT,
            pattern.condition(ADDRESS_SQL, 1)
        );
        let mut stmt = self.db.conn().prepare(&sql)?;
        let found = stmt
            .query_map([pattern.value()], Address::from_row)?
            .map(|r| r.map(|(_, a)| a))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        pattern.finish(Entity::Address, found)
    }

    pub fn get(&self, address: &str) -> Result<AddressEditor<'db>> {
        let (id, address) = self.fetch(address)?;
        Ok(AddressEditor {
            handle: Handle::new(self.db, id)?,
            address,
        })
    }

    /// Create an address, creating its domain as `internet` if it is new
    pub fn insert(&self, address: &str) -> Result<AddressEditor<'db>> {
        self.db.generation()?;
        let parts = decode_address(address)?;
        let conn = self.db.conn();
        if resolve(conn, &parts)?.is_some() {
            return Err(MailDbError::duplicate(Entity::Address, parts.to_string()));
        }
        let id = create(conn, &parts)?;
        tracing::info!(address = %parts, "Address created");

        let (_, address) = self.fetch(&parts.to_string())?;
        Ok(AddressEditor {
            handle: Handle::new(self.db, id)?,
            address,
        })
    }

    /// Delete an address nothing depends on
    ///
    /// Its domain goes with it if no other address uses the domain.
    pub fn delete(&self, address: &str) -> Result<()> {
        self.db.generation()?;
        let (id, address) = self.fetch(address)?;
        let conn = self.db.conn();

        let (is_source, is_target, is_mailbox): (bool, bool, bool) = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM alias WHERE address = ?1),
                    EXISTS (SELECT 1 FROM alias WHERE target = ?1),
                    EXISTS (SELECT 1 FROM vmailbox WHERE id = ?1)",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        if is_source {
            return Err(MailDbError::IsAlias(address.address));
        }
        if is_target || is_mailbox {
            return Err(MailDbError::busy(Entity::Address, address.address));
        }

        conn.execute("DELETE FROM address WHERE id = ?1", [id])
            .map_err(|e| {
                translate(e, |c| {
                    (*c == Constraint::ForeignKey)
                        .then(|| MailDbError::busy(Entity::Address, &address.address))
                })
            })?;
        tracing::info!(address = %address.address, "Address deleted");
        Ok(())
    }

    pub fn export(&self) -> Result<Vec<String>> {
        Ok(self.find("*")?.iter().map(Address::to_line).collect())
    }
}

#[derive(Debug)]
pub struct AddressEditor<'db> {
    handle: Handle<'db>,
    address: Address,
}

impl AddressEditor<'_> {
    pub fn record(&self) -> &Address {
        &self.address
    }

    /// Override the domain's transport, empty to inherit it again
    pub fn set_transport(&mut self, name: &str) -> Result<()> {
        let conn = self.handle.conn()?;
        let id = non_empty(name).map(|n| transport_id(conn, n)).transpose()?;
        conn.execute(
            "UPDATE address SET transport = ?1 WHERE id = ?2",
            params![id, self.handle.id()],
        )?;
        self.address.transport = non_empty(name).map(str::to_string);
        tracing::info!(address = %self.address.address, transport = ?self.address.transport, "Address transport changed");
        Ok(())
    }

    /// Override the domain's access rule, empty to inherit it again
    pub fn set_access(&mut self, name: &str) -> Result<()> {
        let conn = self.handle.conn()?;
        let id = non_empty(name).map(|n| access_id(conn, n)).transpose()?;
        conn.execute(
            "UPDATE address SET access = ?1 WHERE id = ?2",
            params![id, self.handle.id()],
        )?;
        self.address.access = non_empty(name).map(str::to_string);
        tracing::info!(address = %self.address.address, access = ?self.address.access, "Address access changed");
        Ok(())
    }

    pub fn set_rclass(&mut self, rclass: &str) -> Result<()> {
        let conn = self.handle.conn()?;
        let rclass = option_value("rclass", rclass)?;
        conn.execute(
            "UPDATE address SET rclass = ?1 WHERE id = ?2",
            params![rclass, self.handle.id()],
        )?;
        self.address.rclass = rclass;
        tracing::info!(address = %self.address.address, rclass = ?self.address.rclass, "Address rclass changed");
        Ok(())
    }

    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "transport" => self.set_transport(value),
            "access" => self.set_access(value),
            "rclass" => self.set_rclass(value),
            _ => Err(unknown_field(Entity::Address, key)),
        }
    }
}
