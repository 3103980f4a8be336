//! Aliases: local (aliases(5)) and virtual (per-domain) recipient lists
//!
//! An alias is not a row of its own. It is the set of `alias` rows sharing a
//! source address, so the repository works in terms of recipients:
//! [`Aliases::make_alias`] adds them and [`Aliases::remove_recipient`] takes
//! them away. Removing the last recipient removes the alias, and the schema
//! then collects any address and domain left unreferenced.

use super::address::{ensure_address, resolve, ADDRESS_SQL};
use super::domain::domain_row;
use super::{DomainClass, Pattern};
use crate::db::{raise, translate, Constraint, Database};
use crate::error::Entity;
use crate::mail::{decode_address, decode_target, AddressError, AddressParts};
use crate::{MailDbError, Result};
use mapfile::Syntax;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasKind {
    /// Source has no domain; recipients may be files, pipes or includes
    Local,
    /// Source has a domain; recipients must be addresses
    Virtual,
}

impl AliasKind {
    fn of(parts: &AddressParts) -> Self {
        if parts.domain.is_some() {
            AliasKind::Virtual
        } else {
            AliasKind::Local
        }
    }

    pub fn syntax(self) -> Syntax {
        match self {
            AliasKind::Local => Syntax::Aliases,
            AliasKind::Virtual => Syntax::Postfix,
        }
    }
}

impl fmt::Display for AliasKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasKind::Local => write!(f, "local"),
            AliasKind::Virtual => write!(f, "virtual"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alias {
    pub address: String,
    pub kind: AliasKind,
    /// In the order they were added
    pub recipients: Vec<String>,
}

impl Alias {
    /// `source: r1, r2` for local aliases, `source r1, r2` for virtual ones
    pub fn to_line(&self) -> String {
        self.kind.syntax().format(&self.address, &self.recipients)
    }
}

fn recipients(conn: &Connection, id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT coalesce(al.extension, t.localpart || coalesce('@' || td.name, ''))
           FROM alias al
           LEFT JOIN address t ON t.id = al.target
           LEFT JOIN domain td ON td.id = t.domain
          WHERE al.address = ?1
          ORDER BY al.id",
    )?;
    let found = stmt
        .query_map([id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(found)
}

fn has_recipients(conn: &Connection, id: i64) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM alias WHERE address = ?1)",
        [id],
        |row| row.get(0),
    )?)
}

#[derive(Debug)]
pub struct Aliases<'db> {
    db: &'db Database,
}

impl<'db> Aliases<'db> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self { db }
    }

    fn source_id(&self, parts: &AddressParts) -> Result<i64> {
        resolve(self.db.conn(), parts)?
            .ok_or_else(|| MailDbError::not_found(Entity::Alias, parts.to_string()))
    }

    /// The alias with this source address
    ///
    /// An address that exists but has no recipients is *not-alias*.
    pub fn lookup(&self, address: &str) -> Result<Alias> {
        tracing::debug!(alias = %address, "Looking up alias");
        let parts = decode_address(address)?;
        let id = self.source_id(&parts)?;
        let recipients = recipients(self.db.conn(), id)?;
        if recipients.is_empty() {
            return Err(MailDbError::NotAlias(parts.to_string()));
        }
        Ok(Alias {
            address: parts.to_string(),
            kind: AliasKind::of(&parts),
            recipients,
        })
    }

    /// Aliases of either kind whose source matches the pattern
    pub fn find(&self, pattern: &str) -> Result<Vec<Alias>> {
        self.find_kind(None, pattern)
    }

    /// Aliases of one kind, or both when `kind` is `None`
    pub fn find_kind(&self, kind: Option<AliasKind>, pattern: &str) -> Result<Vec<Alias>> {
        let pattern = Pattern::lowercase(pattern);
        let kind_filter = match kind {
            Some(AliasKind::Local) => " AND a.domain IS NULL",
            Some(AliasKind::Virtual) => " AND a.domain IS NOT NULL",
            None => "",
        };
        let sql = format!(
            "SELECT a.id, {}, a.domain IS NOT NULL
               FROM address a
               LEFT JOIN domain d ON d.id = a.domain
              WHERE EXISTS (SELECT 1 FROM alias WHERE alias.address = a.id)
                AND {}{}
              ORDER BY coalesce(d.name, ''), a.localpart",
            ADDRESS_SQL,
            pattern.condition(ADDRESS_SQL, 1),
            kind_filter
        );

        let conn = self.db.conn();
        let mut stmt = conn.prepare(&sql)?;
        let sources = stmt
            .query_map([pattern.value()], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, bool>(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut found = Vec::with_capacity(sources.len());
        for (id, address, is_virtual) in sources {
            found.push(Alias {
                address,
                kind: if is_virtual {
                    AliasKind::Virtual
                } else {
                    AliasKind::Local
                },
                recipients: recipients(conn, id)?,
            });
        }
        pattern.finish(Entity::Alias, found)
    }

    /// Add recipients to an alias, creating it if needed
    ///
    /// Recipients already present are skipped. A virtual alias only takes
    /// addresses; one file, pipe or include recipient fails the whole call
    /// before anything is written.
    pub fn make_alias<S: AsRef<str>>(&self, address: &str, recipients: &[S]) -> Result<Alias> {
        self.db.generation()?;
        let source = decode_address(address)?;
        let name = source.to_string();
        if recipients.is_empty() {
            return Err(MailDbError::NoRecipients(name));
        }

        let targets = recipients
            .iter()
            .map(|r| decode_target(r.as_ref()))
            .collect::<std::result::Result<Vec<_>, AddressError>>()?;

        let kind = AliasKind::of(&source);
        for target in &targets {
            if (kind == AliasKind::Virtual && target.is_pipe())
                || (!target.is_pipe() && target.localpart.is_empty())
            {
                return Err(MailDbError::AddressTarget {
                    alias: name,
                    target: target.to_string(),
                });
            }
        }

        let conn = self.db.conn();
        if let Some(domain) = &source.domain {
            if let Some((_, DomainClass::Local)) = domain_row(conn, domain)? {
                return Err(MailDbError::bad_name(
                    Entity::Alias,
                    name,
                    "local domains take no virtual aliases",
                ));
            }
        }

        let source_id = ensure_address(conn, &source)?;
        let mut added = 0;
        for target in &targets {
            if self.add_recipient(conn, &name, source_id, target)? {
                added += 1;
            }
        }
        tracing::info!(alias = %name, kind = %kind, added, "Alias recipients added");

        self.lookup(&name)
    }

    fn add_recipient(
        &self,
        conn: &Connection,
        name: &str,
        source_id: i64,
        target: &AddressParts,
    ) -> Result<bool> {
        let (exists, insert) = if target.is_pipe() {
            let extension = target.extension.as_deref().unwrap_or_default();
            (
                conn.query_row(
                    "SELECT EXISTS (SELECT 1 FROM alias WHERE address = ?1 AND extension = ?2)",
                    params![source_id, extension],
                    |row| row.get::<_, bool>(0),
                )?,
                None,
            )
        } else {
            let target_id = ensure_address(conn, target)?;
            (
                conn.query_row(
                    "SELECT EXISTS (SELECT 1 FROM alias WHERE address = ?1 AND target = ?2)",
                    params![source_id, target_id],
                    |row| row.get::<_, bool>(0),
                )?,
                Some(target_id),
            )
        };
        if exists {
            return Ok(false);
        }

        conn.execute(
            "INSERT INTO alias (address, target, extension) VALUES (?1, ?2, ?3)",
            params![
                source_id,
                insert,
                insert.is_none().then_some(target.extension.as_deref()).flatten()
            ],
        )
        .map_err(|e| {
            translate(e, |c| match c {
                Constraint::Trigger(msg) if msg == raise::ALIAS_IS_MAILBOX => Some(
                    MailDbError::bad_name(Entity::Alias, name, "address is a mailbox"),
                ),
                Constraint::Trigger(msg) if msg == raise::VIRTUAL_TARGET => {
                    Some(MailDbError::AddressTarget {
                        alias: name.to_string(),
                        target: target.to_string(),
                    })
                }
                _ => None,
            })
        })?;
        Ok(true)
    }

    /// Remove one recipient; removing the last one removes the alias
    pub fn remove_recipient(&self, address: &str, recipient: &str) -> Result<()> {
        self.db.generation()?;
        let source = decode_address(address)?;
        let name = source.to_string();
        let source_id = self.source_id(&source)?;
        let target = decode_target(recipient)?;
        let conn = self.db.conn();

        let removed = if target.is_pipe() {
            conn.execute(
                "DELETE FROM alias WHERE address = ?1 AND extension = ?2",
                params![source_id, target.extension],
            )?
        } else {
            match resolve(conn, &target)? {
                Some(target_id) => conn.execute(
                    "DELETE FROM alias WHERE address = ?1 AND target = ?2",
                    params![source_id, target_id],
                )?,
                None => 0,
            }
        };

        if removed == 0 {
            if !has_recipients(conn, source_id)? {
                return Err(MailDbError::NotAlias(name));
            }
            return Err(MailDbError::RecipientNotFound {
                alias: name,
                recipient: target.to_string(),
            });
        }
        tracing::info!(alias = %name, recipient = %target, "Alias recipient removed");
        Ok(())
    }

    /// Remove every recipient of an alias at once
    pub fn remove_alias(&self, address: &str) -> Result<()> {
        self.db.generation()?;
        let source = decode_address(address)?;
        let name = source.to_string();
        let source_id = self.source_id(&source)?;

        let removed = self
            .db
            .conn()
            .execute("DELETE FROM alias WHERE address = ?1", [source_id])?;
        if removed == 0 {
            return Err(MailDbError::NotAlias(name));
        }
        tracing::info!(alias = %name, recipients = removed, "Alias removed");
        Ok(())
    }

    pub fn export(&self, kind: AliasKind) -> Result<Vec<String>> {
        Ok(self
            .find_kind(Some(kind), "*")?
            .iter()
            .map(Alias::to_line)
            .collect())
    }
}
