use super::MapKind;
use crate::db::Database;
use crate::error::Entity;
use crate::mail::decode_address;
use crate::repo::{parse_assignment, AliasKind, DomainClass, Mailbox, Transport};
use crate::{MailDbError, Result};
use mapfile::Record;
use std::io::BufRead;

/// Import every record of `input` as `kind`, all or nothing
///
/// Returns the number of records imported. Errors raised for a record carry
/// its line number.
pub fn import<R: BufRead>(db: &Database, kind: MapKind, input: R) -> Result<usize> {
    tracing::debug!(kind = %kind, syntax = %kind.syntax(), "Importing map");

    let count = db.transaction(|db| {
        let count = mapfile::read(input, kind.syntax(), |record| load(db, kind, record))?;
        Ok(count)
    })?;

    tracing::info!(kind = %kind, records = count, "Map imported");
    Ok(count)
}

fn load(db: &Database, kind: MapKind, record: Record) -> Result<()> {
    tracing::debug!(kind = %kind, line = record.line, key = %record.key, "Importing record");

    match kind {
        MapKind::Access => {
            db.access().insert(&record.key, &record.rest())?;
        }
        MapKind::Transport => {
            let (transport, nexthop) = Transport::parse_spec(&record.rest())?;
            db.transports().insert(
                &record.key,
                transport.as_deref().unwrap_or_default(),
                nexthop.as_deref().unwrap_or_default(),
            )?;
        }
        MapKind::Domain => {
            let rest = record.rest();
            let mut tokens = rest
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|t| !t.is_empty());
            let class: DomainClass = tokens.next().unwrap_or_default().parse()?;
            let mut domain = db.domains().insert(&record.key, Some(class))?;
            for token in tokens {
                let (key, value) = parse_assignment(token)?;
                domain.apply(&key, &value)?;
            }
        }
        MapKind::Address => {
            let mut address = db.addresses().insert(&record.key)?;
            for value in &record.values {
                let (key, value) = parse_assignment(value)?;
                address.apply(&key, &value)?;
            }
        }
        MapKind::VirtualAlias | MapKind::LocalAlias => {
            let source = decode_address(&record.key)?;
            let wanted = kind.alias_kind();
            let actual = if source.domain.is_some() {
                AliasKind::Virtual
            } else {
                AliasKind::Local
            };
            if wanted != Some(actual) {
                let reason = match actual {
                    AliasKind::Virtual => "local aliases have no domain",
                    AliasKind::Local => "virtual aliases need a domain",
                };
                return Err(MailDbError::bad_name(Entity::Alias, &record.key, reason));
            }
            db.aliases().make_alias(&record.key, &record.values)?;
        }
        MapKind::Mailbox => {
            let line = std::iter::once(record.key.as_str())
                .chain(record.values.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ");
            let mailbox = Mailbox::parse_line(&line)?;
            db.mailboxes().insert(&mailbox.address)?.assign(&mailbox)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(db: &Database, kind: MapKind, input: &str) -> Result<usize> {
        import(db, kind, input.as_bytes())
    }

    #[test]
    fn test_import_access() {
        let db = Database::open_in_memory().unwrap();
        let count = run(&db, MapKind::Access, "# rules\npolite x-polite\nnothing x-nothing\n").unwrap();
        assert_eq!(count, 2);
        assert_eq!(db.access().lookup("polite").unwrap().action, "x-polite");
        assert!(!db.in_transaction());
    }

    #[test]
    fn test_bad_record_rolls_back_everything() {
        let db = Database::open_in_memory().unwrap();
        let err = run(&db, MapKind::Transport, "good smtp:mx\nbogus foo\n").unwrap_err();
        match &err {
            MailDbError::ImportRecord { line, source } => {
                assert_eq!(*line, 2);
                assert!(source.to_string().contains("must include ':'"));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(db.transports().lookup("good").unwrap_err().is_not_found());
    }

    #[test]
    fn test_syntax_errors() {
        let db = Database::open_in_memory().unwrap();
        let err = run(&db, MapKind::Transport, "goofy\n").unwrap_err();
        assert!(
            matches!(&err, MailDbError::ImportSyntax { line: 1, message } if message.contains("only one token"))
        );

        let err = run(&db, MapKind::LocalAlias, "root: bill\nno colon here\n").unwrap_err();
        assert!(matches!(err, MailDbError::ImportSyntax { line: 2, .. }));
        assert!(db.aliases().lookup("root").unwrap_err().is_not_found());

        let err = run(&db, MapKind::Domain, "# nothing\n\n   \n").unwrap_err();
        assert!(matches!(err, MailDbError::ImportEmpty));
    }

    #[test]
    fn test_import_domains() {
        let db = Database::open_in_memory().unwrap();
        run(&db, MapKind::Transport, "relay smtp:[mx.example.com]\n").unwrap();
        run(
            &db,
            MapKind::Domain,
            "example.com relay transport=relay rclass=STALL\npobox.org vmailbox vuid=500 vgid=500\n",
        )
        .unwrap();

        let domain = db.domains().lookup("example.com").unwrap();
        assert_eq!(domain.class, DomainClass::Relay);
        assert_eq!(domain.transport.as_deref(), Some("relay"));
        assert_eq!(db.domains().lookup("pobox.org").unwrap().vuid, Some(500));

        let err = run(&db, MapKind::Domain, "other.org intranet\n").unwrap_err();
        assert!(matches!(err.root(), MailDbError::BadClass(_)));
    }

    #[test]
    fn test_import_aliases_by_kind() {
        let db = Database::open_in_memory().unwrap();
        run(
            &db,
            MapKind::LocalAlias,
            "postmaster: root,\n    bill@sysops\nvacation: \"|/usr/bin/vacation bill\"\n",
        )
        .unwrap();
        assert_eq!(
            db.aliases().lookup("postmaster").unwrap().recipients,
            vec!["root", "bill@sysops"]
        );

        run(&db, MapKind::VirtualAlias, "info@example.com bill@example.com,\n  dave@noc\n")
            .unwrap();
        assert_eq!(db.aliases().lookup("info@example.com").unwrap().recipients.len(), 2);

        let err = run(&db, MapKind::VirtualAlias, "root bill\n").unwrap_err();
        assert!(matches!(err.root(), MailDbError::BadName { .. }));
        let err = run(&db, MapKind::LocalAlias, "info@example.org: bill\n").unwrap_err();
        assert!(matches!(err.root(), MailDbError::BadName { .. }));
        let err = run(&db, MapKind::VirtualAlias, "pipe@plumbing /drain.txt\n").unwrap_err();
        assert!(matches!(err.root(), MailDbError::AddressTarget { .. }));
    }

    #[test]
    fn test_import_mailboxes() {
        let db = Database::open_in_memory().unwrap();
        run(&db, MapKind::Domain, "pobox.org vmailbox\n").unwrap();
        run(
            &db,
            MapKind::Mailbox,
            "jeff@pobox.org:{CRYPT}funny:42:75::black_hole::userdb_quota_rule=*:bytes=1G mbox_enabled=false\nann@pobox.org\n",
        )
        .unwrap();

        let jeff = db.mailboxes().lookup("jeff@pobox.org").unwrap();
        assert_eq!(jeff.password.as_deref(), Some("funny"));
        assert_eq!(jeff.quota.as_deref(), Some("1G"));
        assert!(!jeff.enabled);
        assert!(db.mailboxes().lookup("ann@pobox.org").unwrap().enabled);
    }
}
