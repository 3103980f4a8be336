//! Access rules: named restriction-class actions

use super::{check_name, unknown_field, Handle, Pattern, COMMENT};
use crate::db::{translate, Constraint, Database};
use crate::error::Entity;
use crate::{MailDbError, Result};
use mapfile::Syntax;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessRule {
    pub name: String,
    pub action: String,
}

impl AccessRule {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<(i64, Self)> {
        Ok((
            row.get(0)?,
            Self {
                name: row.get(1)?,
                action: row.get(2)?,
            },
        ))
    }

    /// The line `export` writes for this rule
    pub fn to_line(&self) -> String {
        Syntax::Simple.format(&self.name, &[&self.action])
    }
}

fn check_action(action: &str) -> Result<String> {
    let action = action.trim();
    if action.is_empty() {
        return Err(MailDbError::BadAction("action may not be empty".to_string()));
    }
    if action.contains(COMMENT) {
        return Err(MailDbError::BadAction(format!(
            "action may not contain '#': '{}'",
            action
        )));
    }
    Ok(action.to_string())
}

#[derive(Debug)]
pub struct AccessRules<'db> {
    db: &'db Database,
}

impl<'db> AccessRules<'db> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self { db }
    }

    fn fetch(&self, name: &str) -> Result<(i64, AccessRule)> {
        self.db
            .conn()
            .query_row(
                "SELECT id, name, action FROM access WHERE name = ?1",
                [name.trim()],
                AccessRule::from_row,
            )
            .optional()?
            .ok_or_else(|| MailDbError::not_found(Entity::Access, name.trim()))
    }

    pub fn lookup(&self, name: &str) -> Result<AccessRule> {
        tracing::debug!(access = %name, "Looking up access rule");
        Ok(self.fetch(name)?.1)
    }

    pub fn find(&self, pattern: &str) -> Result<Vec<AccessRule>> {
        let pattern = Pattern::new(pattern);
        let sql = format!(
            "SELECT id, name, action FROM access WHERE {} ORDER BY name",
            pattern.condition("name", 1)
        );
        let mut stmt = self.db.conn().prepare(&sql)?;
        let rules = stmt
            .query_map([pattern.value()], AccessRule::from_row)?
            .map(|r| r.map(|(_, rule)| rule))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        pattern.finish(Entity::Access, rules)
    }

    /// Fetch a rule for editing
    pub fn get(&self, name: &str) -> Result<AccessEditor<'db>> {
        let (id, rule) = self.fetch(name)?;
        Ok(AccessEditor {
            handle: Handle::new(self.db, id)?,
            rule,
        })
    }

    pub fn insert(&self, name: &str, action: &str) -> Result<AccessEditor<'db>> {
        self.db.generation()?;
        let name = check_name(Entity::Access, name)?;
        let action = check_action(action)?;

        self.db
            .conn()
            .execute(
                "INSERT INTO access (name, action) VALUES (?1, ?2)",
                params![name, action],
            )
            .map_err(|e| {
                translate(e, |c| {
                    (*c == Constraint::Unique).then(|| MailDbError::duplicate(Entity::Access, &name))
                })
            })?;

        tracing::info!(access = %name, action = %action, "Access rule created");
        Ok(AccessEditor {
            handle: Handle::new(self.db, self.db.conn().last_insert_rowid())?,
            rule: AccessRule { name, action },
        })
    }

    /// Delete a rule no domain or address refers to
    pub fn delete(&self, name: &str) -> Result<()> {
        self.db.generation()?;
        let (id, rule) = self.fetch(name)?;
        self.db
            .conn()
            .execute("DELETE FROM access WHERE id = ?1", [id])
            .map_err(|e| {
                translate(e, |c| {
                    (*c == Constraint::ForeignKey).then(|| MailDbError::busy(Entity::Access, &rule.name))
                })
            })?;
        tracing::info!(access = %rule.name, "Access rule deleted");
        Ok(())
    }

    pub fn export(&self) -> Result<Vec<String>> {
        Ok(self.find("*")?.iter().map(AccessRule::to_line).collect())
    }
}

/// Setters for one access rule
#[derive(Debug)]
pub struct AccessEditor<'db> {
    handle: Handle<'db>,
    rule: AccessRule,
}

impl AccessEditor<'_> {
    pub fn record(&self) -> &AccessRule {
        &self.rule
    }

    pub fn set_action(&mut self, action: &str) -> Result<()> {
        let conn = self.handle.conn()?;
        let action = check_action(action)?;
        conn.execute(
            "UPDATE access SET action = ?1 WHERE id = ?2",
            params![action, self.handle.id()],
        )?;
        tracing::info!(access = %self.rule.name, action = %action, "Access action changed");
        self.rule.action = action;
        Ok(())
    }

    /// Apply a `key=value` assignment
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "action" => self.set_action(value),
            _ => Err(unknown_field(Entity::Access, key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let db = Database::open_in_memory().unwrap();
        db.transaction(|db| db.access().insert("default", "x-permit").map(|_| ()))
            .unwrap();

        let rule = db.access().lookup("default").unwrap();
        assert_eq!(rule.action, "x-permit");
        assert_eq!(rule.to_line(), "default x-permit");
    }

    #[test]
    fn test_insert_requires_scope() {
        let db = Database::open_in_memory().unwrap();
        let err = db.access().insert("default", "x").err().unwrap();
        assert!(matches!(err, MailDbError::NotInTransaction));
    }

    #[test]
    fn test_duplicate_and_bad_action() {
        let db = Database::open_in_memory().unwrap();
        let scope = db.begin().unwrap();
        db.access().insert("spam", "x-spammer").unwrap();

        let err = db.access().insert("spam", "other").err().unwrap();
        assert!(matches!(err, MailDbError::Duplicate { entity: Entity::Access, .. }));

        let err = db.access().insert("blank", "  ").err().unwrap();
        assert!(matches!(err, MailDbError::BadAction(_)));

        let err = db.access().insert("odd", "REJECT spam #1").err().unwrap();
        assert!(matches!(err, MailDbError::BadAction(_)));

        let mut editor = db.access().get("spam").unwrap();
        assert!(matches!(editor.set_action(""), Err(MailDbError::BadAction(_))));
        assert!(matches!(editor.set_action("x #2"), Err(MailDbError::BadAction(_))));
        assert_eq!(editor.record().action, "x-spammer");
        scope.commit().unwrap();
    }

    #[test]
    fn test_edit_and_stale_editor() {
        let db = Database::open_in_memory().unwrap();
        let scope = db.begin().unwrap();
        let mut editor = db.access().insert("default", "x-permit").unwrap();
        editor.apply("action", "foo").unwrap();
        assert_eq!(editor.record().action, "foo");
        scope.commit().unwrap();

        assert!(matches!(
            editor.set_action("bar"),
            Err(MailDbError::NotInTransaction)
        ));
        assert_eq!(db.access().lookup("default").unwrap().action, "foo");
    }

    #[test]
    fn test_find_and_delete() {
        let db = Database::open_in_memory().unwrap();
        db.transaction(|db| {
            db.access().insert("spam", "x-spammer")?;
            db.access().insert("spam2", "x-spammer")?;
            db.access().insert("ham", "x-ham")?;
            Ok(())
        })
        .unwrap();

        let found = db.access().find("spam*").unwrap();
        assert_eq!(found.len(), 2);
        assert!(db.access().find("nothing*").unwrap().is_empty());
        assert!(db.access().find("nothing").unwrap_err().is_not_found());

        db.transaction(|db| db.access().delete("ham")).unwrap();
        assert!(db.access().lookup("ham").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_busy() {
        let db = Database::open_in_memory().unwrap();
        db.transaction(|db| {
            db.access().insert("strict", "x-strict")?;
            let mut domain = db.domains().insert("example.com", None)?;
            domain.set_access("strict")
        })
        .unwrap();

        let err = db.transaction(|db| db.access().delete("strict")).unwrap_err();
        assert!(matches!(err, MailDbError::Busy { entity: Entity::Access, .. }));
    }
}
