//! Domains and their routing class

use super::{
    access_id, check_name, non_empty, option_value, options, parse_id, transport_id, unknown_field, Handle,
    Pattern,
};
use crate::db::{raise, translate, Constraint, Database};
use crate::error::Entity;
use crate::{MailDbError, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// How the mail system treats a domain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainClass {
    #[default]
    Internet,
    Local,
    Relay,
    Virtual,
    Vmailbox,
}

impl DomainClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainClass::Internet => "internet",
            DomainClass::Local => "local",
            DomainClass::Relay => "relay",
            DomainClass::Virtual => "virtual",
            DomainClass::Vmailbox => "vmailbox",
        }
    }
}

impl fmt::Display for DomainClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DomainClass {
    type Err = MailDbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "internet" => Ok(DomainClass::Internet),
            "local" => Ok(DomainClass::Local),
            "relay" => Ok(DomainClass::Relay),
            "virtual" => Ok(DomainClass::Virtual),
            "vmailbox" => Ok(DomainClass::Vmailbox),
            other => Err(MailDbError::BadClass(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Domain {
    pub name: String,
    pub class: DomainClass,
    pub transport: Option<String>,
    pub access: Option<String>,
    pub vuid: Option<i64>,
    pub vgid: Option<i64>,
    pub rclass: Option<String>,
}

const SELECT: &str = "SELECT d.id, d.name, d.class, t.name, ac.name, d.vuid, d.vgid, d.rclass
                        FROM domain d
                        LEFT JOIN transport t ON t.id = d.transport
                        LEFT JOIN access ac ON ac.id = d.access";

impl Domain {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<(i64, Self)> {
        let class: String = row.get(2)?;
        Ok((
            row.get(0)?,
            Self {
                name: row.get(1)?,
                class: class.parse().unwrap_or_default(),
                transport: row.get(3)?,
                access: row.get(4)?,
                vuid: row.get(5)?,
                vgid: row.get(6)?,
                rclass: row.get(7)?,
            },
        ))
    }

    /// `name class[ key=value ...]`, unset options left out
    pub fn to_line(&self) -> String {
        let mut parts = vec![self.name.clone(), self.class.to_string()];
        parts.extend(options(&[
            ("transport", self.transport.clone()),
            ("access", self.access.clone()),
            ("rclass", self.rclass.clone()),
            ("vuid", self.vuid.map(|v| v.to_string())),
            ("vgid", self.vgid.map(|v| v.to_string())),
        ]));
        parts.join(" ")
    }
}

/// Check and lowercase a domain name
pub(crate) fn check_domain_name(name: &str) -> Result<String> {
    let name = check_name(Entity::Domain, &name.to_lowercase())?;
    if name.starts_with('.') || name.ends_with('.') || name.contains("..") {
        return Err(MailDbError::bad_name(Entity::Domain, name, "empty label"));
    }
    Ok(name)
}

/// Id and class of a domain, if it exists
pub(crate) fn domain_row(conn: &Connection, name: &str) -> Result<Option<(i64, DomainClass)>> {
    let row: Option<(i64, String)> = conn
        .query_row(
            "SELECT id, class FROM domain WHERE name = ?1",
            [name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(row.map(|(id, class)| (id, class.parse().unwrap_or_default())))
}

/// Id of the domain, creating it with the default class if needed
pub(crate) fn ensure_domain(conn: &Connection, name: &str) -> Result<i64> {
    if let Some((id, _)) = domain_row(conn, name)? {
        return Ok(id);
    }
    let name = check_domain_name(name)?;
    conn.execute("INSERT INTO domain (name) VALUES (?1)", [&name])?;
    tracing::info!(domain = %name, "Domain created implicitly");
    Ok(conn.last_insert_rowid())
}

#[derive(Debug)]
pub struct Domains<'db> {
    db: &'db Database,
}

impl<'db> Domains<'db> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self { db }
    }

    fn fetch(&self, name: &str) -> Result<(i64, Domain)> {
        let name = name.trim().to_lowercase();
        self.db
            .conn()
            .query_row(
                &format!("{} WHERE d.name = ?1", SELECT),
                [&name],
                Domain::from_row,
            )
            .optional()?
            .ok_or_else(|| MailDbError::not_found(Entity::Domain, name))
    }

    pub fn lookup(&self, name: &str) -> Result<Domain> {
        tracing::debug!(domain = %name, "Looking up domain");
        Ok(self.fetch(name)?.1)
    }

    pub fn find(&self, pattern: &str) -> Result<Vec<Domain>> {
        let pattern = Pattern::lowercase(pattern);
        let sql = format!(
            "{} WHERE {} ORDER BY d.name",
            SELECT,
            pattern.condition("d.name", 1)
        );
        let mut stmt = self.db.conn().prepare(&sql)?;
        let found = stmt
            .query_map([pattern.value()], Domain::from_row)?
            .map(|r| r.map(|(_, d)| d))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        pattern.finish(Entity::Domain, found)
    }

    pub fn get(&self, name: &str) -> Result<DomainEditor<'db>> {
        let (id, domain) = self.fetch(name)?;
        Ok(DomainEditor {
            handle: Handle::new(self.db, id)?,
            domain,
        })
    }

    /// Create a domain, `internet` unless a class is given
    pub fn insert(&self, name: &str, class: Option<DomainClass>) -> Result<DomainEditor<'db>> {
        self.db.generation()?;
        let name = check_domain_name(name)?;
        let class = class.unwrap_or_default();

        self.db
            .conn()
            .execute(
                "INSERT INTO domain (name, class) VALUES (?1, ?2)",
                params![name, class.as_str()],
            )
            .map_err(|e| {
                translate(e, |c| {
                    (*c == Constraint::Unique).then(|| MailDbError::duplicate(Entity::Domain, &name))
                })
            })?;

        tracing::info!(domain = %name, class = %class, "Domain created");
        Ok(DomainEditor {
            handle: Handle::new(self.db, self.db.conn().last_insert_rowid())?,
            domain: Domain {
                name,
                class,
                transport: None,
                access: None,
                vuid: None,
                vgid: None,
                rclass: None,
            },
        })
    }

    /// Delete a domain no address refers to
    pub fn delete(&self, name: &str) -> Result<()> {
        self.db.generation()?;
        let (id, domain) = self.fetch(name)?;
        self.db
            .conn()
            .execute("DELETE FROM domain WHERE id = ?1", [id])
            .map_err(|e| {
                translate(e, |c| {
                    (*c == Constraint::ForeignKey)
                        .then(|| MailDbError::busy(Entity::Domain, &domain.name))
                })
            })?;
        tracing::info!(domain = %domain.name, "Domain deleted");
        Ok(())
    }

    pub fn export(&self) -> Result<Vec<String>> {
        Ok(self.find("*")?.iter().map(Domain::to_line).collect())
    }
}

#[derive(Debug)]
pub struct DomainEditor<'db> {
    handle: Handle<'db>,
    domain: Domain,
}

impl DomainEditor<'_> {
    pub fn record(&self) -> &Domain {
        &self.domain
    }

    pub fn set_class(&mut self, class: DomainClass) -> Result<()> {
        let conn = self.handle.conn()?;
        let name = &self.domain.name;
        conn.execute(
            "UPDATE domain SET class = ?1 WHERE id = ?2",
            params![class.as_str(), self.handle.id()],
        )
        .map_err(|e| {
            translate(e, |c| match c {
                Constraint::Trigger(msg) if msg == raise::DOMAIN_HOLDS_MAILBOXES => Some(
                    MailDbError::BadClass(format!("{} holds mailboxes, cannot become {}", name, class)),
                ),
                Constraint::Trigger(msg) if msg == raise::DOMAIN_HAS_RECIPIENTS => {
                    Some(MailDbError::BadClass(format!(
                        "addresses in {} are targets of aliases outside it, cannot become {}",
                        name, class
                    )))
                }
                Constraint::Trigger(msg) if msg == raise::DOMAIN_HAS_ALIASES => Some(
                    MailDbError::BadClass(format!("{} has virtual aliases, cannot become {}", name, class)),
                ),
                _ => None,
            })
        })?;
        tracing::info!(domain = %name, class = %class, "Domain class changed");
        self.domain.class = class;
        Ok(())
    }

    /// Set the transport by name, empty to clear
    pub fn set_transport(&mut self, name: &str) -> Result<()> {
        let conn = self.handle.conn()?;
        let id = non_empty(name).map(|n| transport_id(conn, n)).transpose()?;
        conn.execute(
            "UPDATE domain SET transport = ?1 WHERE id = ?2",
            params![id, self.handle.id()],
        )?;
        self.domain.transport = non_empty(name).map(str::to_string);
        tracing::info!(domain = %self.domain.name, transport = ?self.domain.transport, "Domain transport changed");
        Ok(())
    }

    /// Set the access rule by name, empty to clear
    pub fn set_access(&mut self, name: &str) -> Result<()> {
        let conn = self.handle.conn()?;
        let id = non_empty(name).map(|n| access_id(conn, n)).transpose()?;
        conn.execute(
            "UPDATE domain SET access = ?1 WHERE id = ?2",
            params![id, self.handle.id()],
        )?;
        self.domain.access = non_empty(name).map(str::to_string);
        tracing::info!(domain = %self.domain.name, access = ?self.domain.access, "Domain access changed");
        Ok(())
    }

    pub fn set_rclass(&mut self, rclass: &str) -> Result<()> {
        let conn = self.handle.conn()?;
        let rclass = option_value("rclass", rclass)?;
        conn.execute(
            "UPDATE domain SET rclass = ?1 WHERE id = ?2",
            params![rclass, self.handle.id()],
        )?;
        self.domain.rclass = rclass;
        tracing::info!(domain = %self.domain.name, rclass = ?self.domain.rclass, "Domain rclass changed");
        Ok(())
    }

    /// Default uid for mailboxes in this domain
    pub fn set_vuid(&mut self, vuid: Option<i64>) -> Result<()> {
        let conn = self.handle.conn()?;
        conn.execute(
            "UPDATE domain SET vuid = ?1 WHERE id = ?2",
            params![vuid, self.handle.id()],
        )?;
        self.domain.vuid = vuid;
        tracing::info!(domain = %self.domain.name, vuid = ?vuid, "Domain vuid changed");
        Ok(())
    }

    /// Default gid for mailboxes in this domain
    pub fn set_vgid(&mut self, vgid: Option<i64>) -> Result<()> {
        let conn = self.handle.conn()?;
        conn.execute(
            "UPDATE domain SET vgid = ?1 WHERE id = ?2",
            params![vgid, self.handle.id()],
        )?;
        self.domain.vgid = vgid;
        tracing::info!(domain = %self.domain.name, vgid = ?vgid, "Domain vgid changed");
        Ok(())
    }

    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "class" => self.set_class(value.parse()?),
            "transport" => self.set_transport(value),
            "access" => self.set_access(value),
            "rclass" => self.set_rclass(value),
            "vuid" => self.set_vuid(parse_id("vuid", value)?),
            "vgid" => self.set_vgid(parse_id("vgid", value)?),
            _ => Err(unknown_field(Entity::Domain, key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_parse() {
        assert_eq!("VMailbox".parse::<DomainClass>().unwrap(), DomainClass::Vmailbox);
        assert!(matches!(
            "intranet".parse::<DomainClass>(),
            Err(MailDbError::BadClass(_))
        ));
    }

    #[test]
    fn test_insert_and_options() {
        let db = Database::open_in_memory().unwrap();
        db.transaction(|db| {
            db.transports().insert("relay", "smtp", "mx.example.com")?;
            db.access().insert("strict", "x-strict")?;
            let mut domain = db.domains().insert("Example.COM", Some(DomainClass::Relay))?;
            domain.apply("transport", "relay")?;
            domain.apply("access", "strict")?;
            domain.apply("rclass", "STALL")?;
            domain.apply("vuid", "500")?;
            Ok(())
        })
        .unwrap();

        let domain = db.domains().lookup("example.com").unwrap();
        assert_eq!(domain.class, DomainClass::Relay);
        assert_eq!(domain.transport.as_deref(), Some("relay"));
        assert_eq!(
            domain.to_line(),
            "example.com relay transport=relay access=strict rclass=STALL vuid=500"
        );

        db.transaction(|db| {
            let mut domain = db.domains().get("example.com")?;
            domain.apply("transport", "")?;
            domain.apply("vuid", "")
        })
        .unwrap();
        assert_eq!(
            db.domains().lookup("example.com").unwrap().to_line(),
            "example.com relay access=strict rclass=STALL"
        );
    }

    #[test]
    fn test_missing_reference() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .transaction(|db| {
                let mut domain = db.domains().insert("example.com", None)?;
                domain.set_transport("nowhere")
            })
            .unwrap_err();
        assert!(matches!(err, MailDbError::NotFound { entity: Entity::Transport, .. }));
        assert!(db.domains().lookup("example.com").unwrap_err().is_not_found());
    }

    #[test]
    fn test_bad_names() {
        let db = Database::open_in_memory().unwrap();
        let scope = db.begin().unwrap();
        for name in ["", "two words", "bill@example.com", ".example.com", "a..b"] {
            assert!(
                matches!(db.domains().insert(name, None), Err(MailDbError::BadName { .. })),
                "accepted {:?}",
                name
            );
        }
        db.domains().insert("example.com", None).unwrap();
        assert!(matches!(
            db.domains().insert("EXAMPLE.com", None),
            Err(MailDbError::Duplicate { .. })
        ));
        scope.rollback().unwrap();
    }

    #[test]
    fn test_views_follow_class() {
        let db = Database::open_in_memory().unwrap();
        db.transaction(|db| {
            db.domains().insert("relay.example", Some(DomainClass::Relay))?;
            db.domains().insert("local.example", Some(DomainClass::Local))?;
            Ok(())
        })
        .unwrap();

        let relay: String = db
            .conn()
            .query_row("SELECT name FROM relay_domain", [], |row| row.get(0))
            .unwrap();
        assert_eq!(relay, "relay.example");
        let local: String = db
            .conn()
            .query_row("SELECT name FROM local_domain", [], |row| row.get(0))
            .unwrap();
        assert_eq!(local, "local.example");
    }

    #[test]
    fn test_local_class_refused_with_virtual_aliases() {
        let db = Database::open_in_memory().unwrap();
        db.transaction(|db| db.aliases().make_alias("info@example.com", &["bill@other.org"]))
            .unwrap();

        let err = db
            .transaction(|db| db.domains().get("example.com")?.set_class(DomainClass::Local))
            .unwrap_err();
        assert!(matches!(err, MailDbError::BadClass(_)));
        assert_eq!(
            db.domains().lookup("example.com").unwrap().class,
            DomainClass::Internet
        );

        // other.org only holds a recipient
        db.transaction(|db| db.domains().get("other.org")?.set_class(DomainClass::Local))
            .unwrap();
        assert_eq!(db.domains().lookup("other.org").unwrap().class, DomainClass::Local);
    }

    #[test]
    fn test_vmailbox_class_refused_for_outside_recipients() {
        let db = Database::open_in_memory().unwrap();
        db.transaction(|db| db.aliases().make_alias("info@example.com", &["jeff@pobox.org"]))
            .unwrap();

        let err = db
            .transaction(|db| db.domains().get("pobox.org")?.set_class(DomainClass::Vmailbox))
            .unwrap_err();
        assert!(matches!(err, MailDbError::BadClass(_)));
        assert_eq!(
            db.domains().lookup("pobox.org").unwrap().class,
            DomainClass::Internet
        );
    }

    #[test]
    fn test_vmailbox_class_allows_inside_recipients() {
        let db = Database::open_in_memory().unwrap();
        db.transaction(|db| db.aliases().make_alias("info@pobox.org", &["jeff@pobox.org"]))
            .unwrap();

        db.transaction(|db| db.domains().get("pobox.org")?.set_class(DomainClass::Vmailbox))
            .unwrap();
        assert_eq!(
            db.domains().lookup("pobox.org").unwrap().class,
            DomainClass::Vmailbox
        );
    }
}
