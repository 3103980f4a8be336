//! Virtual mailboxes: IMAP/POP accounts under `vmailbox` domains

use super::address::{ensure_address, render};
use super::domain::domain_row;
use super::{non_empty, parse_id, unknown_field, DomainClass, Handle, Pattern};
use crate::db::{raise, translate, Constraint, Database};
use crate::error::Entity;
use crate::mail::decode_address;
use crate::{MailDbError, Result};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Quota reported for mailboxes without one of their own
pub const DEFAULT_QUOTA: &str = "300M";

/// Characters a password or home directory may not contain
const FIELD_ILLEGAL: &[char] = &[':', ',', '#'];

/// Password scheme, as Dovecot spells it inside `{}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PasswordType {
    #[default]
    Plain,
    Crypt,
    Md5Crypt,
    Sha256Crypt,
    Sha512Crypt,
    BlfCrypt,
    Sha,
    Sha256,
    Sha512,
    Ssha,
    Ssha256,
    Ssha512,
    Argon2i,
    Argon2id,
}

impl PasswordType {
    pub const ALL: [PasswordType; 14] = [
        PasswordType::Plain,
        PasswordType::Crypt,
        PasswordType::Md5Crypt,
        PasswordType::Sha256Crypt,
        PasswordType::Sha512Crypt,
        PasswordType::BlfCrypt,
        PasswordType::Sha,
        PasswordType::Sha256,
        PasswordType::Sha512,
        PasswordType::Ssha,
        PasswordType::Ssha256,
        PasswordType::Ssha512,
        PasswordType::Argon2i,
        PasswordType::Argon2id,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PasswordType::Plain => "PLAIN",
            PasswordType::Crypt => "CRYPT",
            PasswordType::Md5Crypt => "MD5-CRYPT",
            PasswordType::Sha256Crypt => "SHA256-CRYPT",
            PasswordType::Sha512Crypt => "SHA512-CRYPT",
            PasswordType::BlfCrypt => "BLF-CRYPT",
            PasswordType::Sha => "SHA",
            PasswordType::Sha256 => "SHA256",
            PasswordType::Sha512 => "SHA512",
            PasswordType::Ssha => "SSHA",
            PasswordType::Ssha256 => "SSHA256",
            PasswordType::Ssha512 => "SSHA512",
            PasswordType::Argon2i => "ARGON2I",
            PasswordType::Argon2id => "ARGON2ID",
        }
    }
}

impl fmt::Display for PasswordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PasswordType {
    type Err = MailDbError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_uppercase();
        PasswordType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or(MailDbError::BadPasswordType(wanted))
    }
}

impl Serialize for PasswordType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Normalise a quota: `none` is unlimited (`0`), otherwise a byte count
/// with an optional `K`, `M`, `G` or `T` suffix. Empty means the default.
pub fn normalize_quota(value: &str) -> Result<Option<String>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if value.eq_ignore_ascii_case("none") {
        return Ok(Some("0".to_string()));
    }

    let quota = value.to_uppercase();
    let digits = quota
        .strip_suffix(['K', 'M', 'G', 'T'])
        .unwrap_or(quota.as_str());
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MailDbError::BadValue(format!(
            "quota must be 'none' or a size such as 512M: '{}'",
            value
        )));
    }
    Ok(Some(quota))
}

fn check_field(field: &str, value: &str) -> Result<Option<String>> {
    match non_empty(value) {
        None => Ok(None),
        Some(v) if v.contains(FIELD_ILLEGAL) || v.contains(char::is_whitespace) => {
            Err(MailDbError::BadValue(format!(
                "{} may not contain ':', ',', '#' or whitespace",
                field
            )))
        }
        Some(v) => Ok(Some(v.to_string())),
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(MailDbError::BadValue(format!(
            "{} must be true or false: '{}'",
            field, other
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mailbox {
    pub address: String,
    pub pw_type: PasswordType,
    pub password: Option<String>,
    pub uid: Option<i64>,
    pub gid: Option<i64>,
    pub quota: Option<String>,
    pub home: Option<String>,
    pub enabled: bool,
}

const SELECT: &str = "SELECT v.id, a.localpart, d.name, v.pw_type, v.password, v.uid, v.gid,
                             v.quota, v.home, v.enable
                        FROM vmailbox v
                        JOIN address a ON a.id = v.id
                        JOIN domain d ON d.id = a.domain";

impl Mailbox {
    fn new(address: String) -> Self {
        Self {
            address,
            pw_type: PasswordType::default(),
            password: None,
            uid: None,
            gid: None,
            quota: None,
            home: None,
            enabled: true,
        }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<(i64, Self)> {
        let localpart: String = row.get(1)?;
        let domain: String = row.get(2)?;
        let pw_type: String = row.get(3)?;
        Ok((
            row.get(0)?,
            Self {
                address: render(&localpart, Some(domain.as_str())),
                pw_type: pw_type.parse().unwrap_or_default(),
                password: row.get(4)?,
                uid: row.get(5)?,
                gid: row.get(6)?,
                quota: row.get(7)?,
                home: row.get(8)?,
                enabled: row.get(9)?,
            },
        ))
    }

    /// The Dovecot passwd-file line for this mailbox
    ///
    /// `user:{TYPE}password:uid:gid::home::userdb_quota_rule=*:bytes=Q mbox_enabled=B`
    pub fn to_line(&self) -> String {
        format!(
            "{}:{{{}}}{}:{}:{}::{}::userdb_quota_rule=*:bytes={} mbox_enabled={}",
            self.address,
            self.pw_type,
            self.password.as_deref().unwrap_or("*"),
            self.uid.map(|v| v.to_string()).unwrap_or_default(),
            self.gid.map(|v| v.to_string()).unwrap_or_default(),
            self.home.as_deref().unwrap_or_default(),
            self.quota.as_deref().unwrap_or(DEFAULT_QUOTA),
            self.enabled
        )
    }

    /// Parse a passwd-file line as written by [`Mailbox::to_line`]
    ///
    /// Every field after the address may be missing or empty. A quota equal
    /// to the default is not kept.
    pub fn parse_line(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.trim().splitn(8, ':').collect();
        let field = |i: usize| fields.get(i).copied().unwrap_or_default();

        let mut mailbox = Mailbox::new(decode_address(field(0))?.to_string());

        let password = field(1).trim();
        let password = match password.strip_prefix('{') {
            Some(rest) => {
                let (scheme, secret) = rest.split_once('}').ok_or_else(|| {
                    MailDbError::BadValue(format!("unterminated password scheme in '{}'", password))
                })?;
                mailbox.pw_type = scheme.parse()?;
                secret
            }
            None => password,
        };
        mailbox.password = match password {
            "*" => None,
            other => check_field("password", other)?,
        };

        mailbox.uid = parse_id("uid", field(2))?;
        mailbox.gid = parse_id("gid", field(3))?;
        mailbox.home = check_field("home", field(5))?;

        for extra in field(7).split_whitespace() {
            let (key, value) = extra.split_once('=').unwrap_or((extra, ""));
            match key {
                "userdb_quota_rule" => {
                    let bytes = value.strip_prefix("*:bytes=").ok_or_else(|| {
                        MailDbError::BadValue(format!("unsupported quota rule '{}'", value))
                    })?;
                    mailbox.quota =
                        normalize_quota(bytes)?.filter(|q| q.as_str() != DEFAULT_QUOTA);
                }
                "mbox_enabled" => mailbox.enabled = parse_bool("mbox_enabled", value)?,
                _ => {
                    return Err(MailDbError::BadValue(format!(
                        "unknown mailbox field '{}'",
                        key
                    )))
                }
            }
        }
        Ok(mailbox)
    }
}

#[derive(Debug)]
pub struct Mailboxes<'db> {
    db: &'db Database,
}

impl<'db> Mailboxes<'db> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self { db }
    }

    fn fetch(&self, address: &str) -> Result<(i64, Mailbox)> {
        let parts = decode_address(address)?;
        self.db
            .conn()
            .query_row(
                &format!("{} WHERE a.localpart = ?1 AND d.name IS ?2", SELECT),
                params![parts.mailbox(), parts.domain],
                Mailbox::from_row,
            )
            .optional()?
            .ok_or_else(|| MailDbError::not_found(Entity::Mailbox, parts.to_string()))
    }

    pub fn lookup(&self, address: &str) -> Result<Mailbox> {
        tracing::debug!(mailbox = %address, "Looking up mailbox");
        Ok(self.fetch(address)?.1)
    }

    pub fn find(&self, pattern: &str) -> Result<Vec<Mailbox>> {
        let pattern = Pattern::lowercase(pattern);
        let sql = format!(
            "{} WHERE {} ORDER BY d.name, a.localpart",
            SELECT,
            pattern.condition("a.localpart || '@' || d.name", 1)
        );
        let mut stmt = self.db.conn().prepare(&sql)?;
        let found = stmt
            .query_map([pattern.value()], Mailbox::from_row)?
            .map(|r| r.map(|(_, m)| m))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        pattern.finish(Entity::Mailbox, found)
    }

    pub fn get(&self, address: &str) -> Result<MailboxEditor<'db>> {
        let (id, mailbox) = self.fetch(address)?;
        Ok(MailboxEditor {
            handle: Handle::new(self.db, id)?,
            mailbox,
        })
    }

    /// Create a mailbox with default settings
    ///
    /// The address must be in an existing `vmailbox` domain and must not be
    /// the source of an alias.
    pub fn insert(&self, address: &str) -> Result<MailboxEditor<'db>> {
        self.db.generation()?;
        let parts = decode_address(address)?;
        let name = parts.to_string();
        if parts.localpart.is_empty() {
            return Err(MailDbError::bad_name(
                Entity::Mailbox,
                name,
                "a catch-all cannot be a mailbox",
            ));
        }

        let conn = self.db.conn();
        let in_mailbox_domain = match &parts.domain {
            Some(domain) => matches!(domain_row(conn, domain)?, Some((_, DomainClass::Vmailbox))),
            None => false,
        };
        if !in_mailbox_domain {
            return Err(MailDbError::MboxNotMboxDomain(name));
        }

        let id = ensure_address(conn, &parts)?;
        conn.execute("INSERT INTO vmailbox (id) VALUES (?1)", [id])
            .map_err(|e| {
                translate(e, |c| match c {
                    Constraint::Unique => Some(MailDbError::duplicate(Entity::Mailbox, &name)),
                    Constraint::Trigger(msg) if msg == raise::MAILBOX_IS_ALIAS => {
                        Some(MailDbError::MboxIsAlias(name.clone()))
                    }
                    Constraint::Trigger(msg) if msg == raise::NOT_VMAILBOX_DOMAIN => {
                        Some(MailDbError::MboxNotMboxDomain(name.clone()))
                    }
                    _ => None,
                })
            })?;

        tracing::info!(mailbox = %name, "Mailbox created");
        Ok(MailboxEditor {
            handle: Handle::new(self.db, id)?,
            mailbox: Mailbox::new(name),
        })
    }

    /// Delete a mailbox no alias delivers to
    pub fn delete(&self, address: &str) -> Result<()> {
        self.db.generation()?;
        let (id, mailbox) = self.fetch(address)?;
        let conn = self.db.conn();

        let is_recipient: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM alias WHERE target = ?1)",
            [id],
            |row| row.get(0),
        )?;
        if is_recipient {
            return Err(MailDbError::MboxIsRecipient(mailbox.address));
        }

        conn.execute("DELETE FROM vmailbox WHERE id = ?1", [id])?;
        tracing::info!(mailbox = %mailbox.address, "Mailbox deleted");
        Ok(())
    }

    pub fn export(&self) -> Result<Vec<String>> {
        Ok(self.find("*")?.iter().map(Mailbox::to_line).collect())
    }
}

#[derive(Debug)]
pub struct MailboxEditor<'db> {
    handle: Handle<'db>,
    mailbox: Mailbox,
}

impl MailboxEditor<'_> {
    pub fn record(&self) -> &Mailbox {
        &self.mailbox
    }

    fn update<T: rusqlite::ToSql>(&self, column: &str, value: T) -> Result<()> {
        let conn = self.handle.conn()?;
        conn.execute(
            &format!("UPDATE vmailbox SET {} = ?1 WHERE id = ?2", column),
            params![value, self.handle.id()],
        )?;
        tracing::info!(mailbox = %self.mailbox.address, field = column, "Mailbox changed");
        Ok(())
    }

    pub fn set_pw_type(&mut self, pw_type: PasswordType) -> Result<()> {
        self.update("pw_type", pw_type.as_str())?;
        self.mailbox.pw_type = pw_type;
        Ok(())
    }

    /// Set the password as stored, already hashed for its scheme; empty
    /// clears it
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        let password = check_field("password", password)?;
        self.update("password", &password)?;
        self.mailbox.password = password;
        Ok(())
    }

    pub fn set_uid(&mut self, uid: Option<i64>) -> Result<()> {
        self.update("uid", uid)?;
        self.mailbox.uid = uid;
        Ok(())
    }

    pub fn set_gid(&mut self, gid: Option<i64>) -> Result<()> {
        self.update("gid", gid)?;
        self.mailbox.gid = gid;
        Ok(())
    }

    /// See [`normalize_quota`]
    pub fn set_quota(&mut self, quota: &str) -> Result<()> {
        let quota = normalize_quota(quota)?;
        self.update("quota", &quota)?;
        self.mailbox.quota = quota;
        Ok(())
    }

    pub fn set_home(&mut self, home: &str) -> Result<()> {
        let home = check_field("home", home)?;
        self.update("home", &home)?;
        self.mailbox.home = home;
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.update("enable", enabled)?;
        self.mailbox.enabled = enabled;
        Ok(())
    }

    pub fn enable(&mut self) -> Result<()> {
        self.set_enabled(true)
    }

    pub fn disable(&mut self) -> Result<()> {
        self.set_enabled(false)
    }

    /// Copy every field but the address from `mailbox`
    pub fn assign(&mut self, mailbox: &Mailbox) -> Result<()> {
        self.set_pw_type(mailbox.pw_type)?;
        self.set_password(mailbox.password.as_deref().unwrap_or_default())?;
        self.set_uid(mailbox.uid)?;
        self.set_gid(mailbox.gid)?;
        self.set_quota(mailbox.quota.as_deref().unwrap_or_default())?;
        self.set_home(mailbox.home.as_deref().unwrap_or_default())?;
        self.set_enabled(mailbox.enabled)
    }

    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "pw_type" => self.set_pw_type(match non_empty(value) {
                Some(v) => v.parse()?,
                None => PasswordType::default(),
            }),
            "password" => self.set_password(value),
            "uid" => self.set_uid(parse_id("uid", value)?),
            "gid" => self.set_gid(parse_id("gid", value)?),
            "quota" => self.set_quota(value),
            "home" => self.set_home(value),
            "enabled" | "enable" => self.set_enabled(parse_bool(key, value)?),
            _ => Err(unknown_field(Entity::Mailbox, key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pobox() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.transaction(|db| {
            db.domains()
                .insert("pobox.org", Some(DomainClass::Vmailbox))
                .map(|_| ())
        })
        .unwrap();
        db
    }

    #[test]
    fn test_password_type_parse() {
        assert_eq!("crypt".parse::<PasswordType>().unwrap(), PasswordType::Crypt);
        assert_eq!(
            "sha512-crypt".parse::<PasswordType>().unwrap(),
            PasswordType::Sha512Crypt
        );
        assert!(matches!(
            "rot13".parse::<PasswordType>(),
            Err(MailDbError::BadPasswordType(_))
        ));
    }

    #[test]
    fn test_normalize_quota() {
        assert_eq!(normalize_quota("").unwrap(), None);
        assert_eq!(normalize_quota("None").unwrap().as_deref(), Some("0"));
        assert_eq!(normalize_quota("512m").unwrap().as_deref(), Some("512M"));
        assert_eq!(normalize_quota("1048576").unwrap().as_deref(), Some("1048576"));
        assert!(normalize_quota("M").is_err());
        assert!(normalize_quota("12MB").is_err());
        assert!(normalize_quota("lots").is_err());
    }

    #[test]
    fn test_default_line() {
        let db = pobox();
        db.transaction(|db| db.mailboxes().insert("Jeff@POBox.org").map(|_| ()))
            .unwrap();
        assert_eq!(
            db.mailboxes().export().unwrap(),
            vec!["jeff@pobox.org:{PLAIN}*::::::userdb_quota_rule=*:bytes=300M mbox_enabled=true"]
        );
    }

    #[test]
    fn test_edit_and_reset() {
        let db = pobox();
        db.transaction(|db| {
            let mut mbox = db.mailboxes().insert("jeff@pobox.org")?;
            for (key, value) in [
                ("pw_type", "CRYPT"),
                ("password", "funny"),
                ("uid", "42"),
                ("gid", "75"),
                ("home", "black_hole"),
                ("quota", "none"),
            ] {
                mbox.apply(key, value)?;
            }
            mbox.disable()
        })
        .unwrap();

        let mbox = db.mailboxes().lookup("jeff@pobox.org").unwrap();
        assert_eq!(mbox.pw_type, PasswordType::Crypt);
        assert_eq!(mbox.password.as_deref(), Some("funny"));
        assert_eq!(mbox.uid, Some(42));
        assert_eq!(mbox.gid, Some(75));
        assert_eq!(mbox.home.as_deref(), Some("black_hole"));
        assert_eq!(mbox.quota.as_deref(), Some("0"));
        assert!(!mbox.enabled);
        assert_eq!(
            mbox.to_line(),
            "jeff@pobox.org:{CRYPT}funny:42:75::black_hole::userdb_quota_rule=*:bytes=0 mbox_enabled=false"
        );

        let deny: String = db
            .conn()
            .query_row(
                "SELECT deny FROM user_deny WHERE username = 'jeff' AND domain = 'pobox.org'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(deny, "true");
    }

    #[test]
    fn test_rejects_bad_fields() {
        let db = pobox();
        let scope = db.begin().unwrap();
        let mut mbox = db.mailboxes().insert("jeff@pobox.org").unwrap();
        assert!(mbox.set_password("a:b").is_err());
        assert!(mbox.set_home("/home/with space").is_err());
        assert!(matches!(
            mbox.apply("pw_type", "rot13"),
            Err(MailDbError::BadPasswordType(_))
        ));
        assert!(mbox.apply("enabled", "maybe").is_err());
        scope.rollback().unwrap();
    }

    #[test]
    fn test_requires_vmailbox_domain() {
        let db = pobox();
        let scope = db.begin().unwrap();
        db.domains().insert("example.com", None).unwrap();
        for address in ["jeff@example.com", "jeff@nowhere.org", "jeff"] {
            assert!(
                matches!(
                    db.mailboxes().insert(address),
                    Err(MailDbError::MboxNotMboxDomain(_))
                ),
                "accepted {}",
                address
            );
        }
        assert!(db.domains().lookup("nowhere.org").unwrap_err().is_not_found());
        scope.rollback().unwrap();
    }

    #[test]
    fn test_alias_exclusivity() {
        let db = pobox();
        db.transaction(|db| {
            db.aliases().make_alias("info@pobox.org", &["jeff@pobox.org"])?;
            db.mailboxes().insert("jeff@pobox.org").map(|_| ())
        })
        .unwrap();

        let err = db
            .transaction(|db| db.mailboxes().insert("info@pobox.org").map(|_| ()))
            .unwrap_err();
        assert!(matches!(err, MailDbError::MboxIsAlias(_)));

        let err = db
            .transaction(|db| db.aliases().make_alias("jeff@pobox.org", &["bill@example.com"]))
            .unwrap_err();
        assert!(matches!(err, MailDbError::BadName { entity: Entity::Alias, .. }));

        let err = db
            .transaction(|db| db.mailboxes().delete("jeff@pobox.org"))
            .unwrap_err();
        assert!(matches!(err, MailDbError::MboxIsRecipient(_)));

        db.transaction(|db| {
            db.aliases().remove_alias("info@pobox.org")?;
            db.mailboxes().delete("jeff@pobox.org")
        })
        .unwrap();
        assert!(db.addresses().lookup("jeff@pobox.org").unwrap_err().is_not_found());
    }

    #[test]
    fn test_class_change_guard() {
        let db = pobox();
        db.transaction(|db| db.mailboxes().insert("jeff@pobox.org").map(|_| ()))
            .unwrap();
        let err = db
            .transaction(|db| db.domains().get("pobox.org")?.set_class(DomainClass::Internet))
            .unwrap_err();
        assert!(matches!(err, MailDbError::BadClass(_)));
    }

    #[test]
    fn test_parse_line() {
        let mbox = Mailbox::parse_line(
            "jeff@pobox.org:{SHA512-CRYPT}$6$salt$hash:42:75::/var/mail/jeff::userdb_quota_rule=*:bytes=1G mbox_enabled=false",
        )
        .unwrap();
        assert_eq!(mbox.pw_type, PasswordType::Sha512Crypt);
        assert_eq!(mbox.password.as_deref(), Some("$6$salt$hash"));
        assert_eq!(mbox.uid, Some(42));
        assert_eq!(mbox.home.as_deref(), Some("/var/mail/jeff"));
        assert_eq!(mbox.quota.as_deref(), Some("1G"));
        assert!(!mbox.enabled);

        let bare = Mailbox::parse_line("ann@pobox.org").unwrap();
        assert_eq!(bare, Mailbox::new("ann@pobox.org".to_string()));

        let default_quota = Mailbox::parse_line(
            "ann@pobox.org:{PLAIN}*::::::userdb_quota_rule=*:bytes=300M mbox_enabled=true",
        )
        .unwrap();
        assert_eq!(default_quota.quota, None);

        assert!(Mailbox::parse_line("ann@pobox.org:{PLAIN*").is_err());
        assert!(Mailbox::parse_line("ann@pobox.org:::::::color=blue").is_err());
    }

    #[test]
    fn test_prefetch_view_uses_domain_ids() {
        let db = pobox();
        db.transaction(|db| {
            let mut domain = db.domains().get("pobox.org")?;
            domain.apply("vuid", "500")?;
            domain.apply("vgid", "500")?;
            db.mailboxes().insert("jeff@pobox.org")?.set_uid(Some(42))?;
            db.mailboxes().insert("ann@pobox.org").map(|_| ())
        })
        .unwrap();

        let (uid, gid): (i64, i64) = db
            .conn()
            .query_row(
                "SELECT userdb_uid, userdb_gid FROM user_prefetch WHERE username = 'ann'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((uid, gid), (500, 500));

        let uid: i64 = db
            .conn()
            .query_row(
                "SELECT uid FROM user_mailbox WHERE username = 'jeff'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(uid, 42);
    }
}
