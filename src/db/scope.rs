//! Transaction scope
//!
//! Scopes nest flat: the outermost [`Database::begin`] opens an SQLite
//! transaction and every inner one shares it. Each outermost begin starts a
//! new generation, and handles created inside a scope remember the
//! generation they were created in. Once that transaction has ended their
//! setters fail with [`MailDbError::NotInTransaction`].

use super::Database;
use crate::{MailDbError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ScopeState {
    depth: u32,
    generation: u64,
}

/// An open unit of work
///
/// Close it with [`Scope::close`], [`Scope::commit`] or [`Scope::rollback`].
/// A scope dropped without being closed rolls back.
#[derive(Debug)]
#[must_use = "a scope rolls back when dropped without being closed"]
pub struct Scope<'db> {
    db: &'db Database,
    outermost: bool,
    closed: bool,
}

impl Database {
    /// Open a transaction scope
    ///
    /// The outermost scope takes the write lock immediately, so a busy
    /// database is reported here rather than halfway through a change.
    pub fn begin(&self) -> Result<Scope<'_>> {
        let mut state = self.scope.get();
        let outermost = state.depth == 0;

        if outermost {
            self.conn().execute_batch("BEGIN IMMEDIATE")?;
            state.generation += 1;
            tracing::debug!(generation = state.generation, "Transaction started");
        }
        state.depth += 1;
        self.scope.set(state);

        Ok(Scope {
            db: self,
            outermost,
            closed: false,
        })
    }

    /// Run `f` inside a scope, committing if it succeeds
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T>,
    {
        let scope = self.begin()?;
        let outcome = f(self);
        scope.close(&outcome)?;
        outcome
    }

    /// Whether a scope is open
    pub fn in_transaction(&self) -> bool {
        self.scope.get().depth > 0
    }

    /// Generation of the open scope, for handles about to be created
    pub(crate) fn generation(&self) -> Result<u64> {
        let state = self.scope.get();
        if state.depth == 0 {
            return Err(MailDbError::NotInTransaction);
        }
        Ok(state.generation)
    }

    /// Fail unless the scope a handle was created in is still open
    pub(crate) fn check_generation(&self, generation: u64) -> Result<()> {
        if self.generation()? != generation {
            return Err(MailDbError::NotInTransaction);
        }
        Ok(())
    }
}

impl Scope<'_> {
    /// Commit if `outcome` is `Ok`, roll back otherwise
    pub fn close<T>(self, outcome: &Result<T>) -> Result<()> {
        if outcome.is_ok() {
            self.commit()
        } else {
            self.rollback()
        }
    }

    pub fn commit(mut self) -> Result<()> {
        self.finish(true)
    }

    pub fn rollback(mut self) -> Result<()> {
        self.finish(false)
    }

    fn finish(&mut self, commit: bool) -> Result<()> {
        self.closed = true;

        let mut state = self.db.scope.get();
        state.depth = state.depth.saturating_sub(1);
        self.db.scope.set(state);

        if !self.outermost {
            return Ok(());
        }

        if commit {
            if let Err(e) = self.db.conn().execute_batch("COMMIT") {
                tracing::warn!(error = %e, "Commit failed, rolling back");
                if let Err(rollback) = self.db.conn().execute_batch("ROLLBACK") {
                    tracing::warn!(error = %rollback, "Rollback after failed commit failed");
                }
                return Err(e.into());
            }
            tracing::debug!(generation = state.generation, "Transaction committed");
        } else {
            self.db.conn().execute_batch("ROLLBACK")?;
            tracing::warn!(generation = state.generation, "Transaction rolled back");
        }
        Ok(())
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.finish(false) {
                tracing::warn!(error = %e, "Rollback of abandoned scope failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(db: &Database) -> i64 {
        db.conn()
            .query_row("SELECT COUNT(*) FROM access", [], |row| row.get(0))
            .unwrap()
    }

    fn insert(db: &Database, name: &str) {
        db.conn()
            .execute(
                "INSERT INTO access (name, action) VALUES (?1, 'x')",
                [name],
            )
            .unwrap();
    }

    #[test]
    fn test_commit_and_rollback() {
        let db = Database::open_in_memory().unwrap();

        let scope = db.begin().unwrap();
        insert(&db, "kept");
        scope.commit().unwrap();

        let scope = db.begin().unwrap();
        insert(&db, "lost");
        scope.rollback().unwrap();

        assert_eq!(count(&db), 1);
        assert!(!db.in_transaction());
    }

    #[test]
    fn test_close_follows_outcome() {
        let db = Database::open_in_memory().unwrap();

        let scope = db.begin().unwrap();
        insert(&db, "lost");
        let outcome: Result<()> = Err(MailDbError::BadValue("boom".into()));
        scope.close(&outcome).unwrap();
        assert_eq!(count(&db), 0);

        let result = db.transaction(|db| {
            insert(db, "kept");
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(count(&db), 1);
    }

    #[test]
    fn test_nested_scopes_are_flat() {
        let db = Database::open_in_memory().unwrap();

        let outer = db.begin().unwrap();
        let inner = db.begin().unwrap();
        insert(&db, "inner");
        inner.commit().unwrap();
        assert!(db.in_transaction());
        outer.rollback().unwrap();

        assert_eq!(count(&db), 0);
        assert!(!db.in_transaction());
    }

    #[test]
    fn test_inner_failure_undone_by_outermost_scope() {
        let db = Database::open_in_memory().unwrap();

        // an inner rollback only closes the inner scope
        let outer = db.begin().unwrap();
        let inner = db.begin().unwrap();
        insert(&db, "inner");
        inner.rollback().unwrap();
        outer.commit().unwrap();
        assert_eq!(count(&db), 1);

        let result: Result<()> = db.transaction(|db| {
            insert(db, "outer");
            db.transaction(|db| {
                insert(db, "nested");
                Err(MailDbError::BadValue("boom".into()))
            })
        });
        assert!(result.is_err());
        assert_eq!(count(&db), 1);
        assert!(!db.in_transaction());
    }

    #[test]
    fn test_drop_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        {
            let _scope = db.begin().unwrap();
            insert(&db, "abandoned");
        }
        assert_eq!(count(&db), 0);
        assert!(!db.in_transaction());
    }

    #[test]
    fn test_generation_tracks_scope() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.generation(), Err(MailDbError::NotInTransaction)));

        let scope = db.begin().unwrap();
        let first = db.generation().unwrap();
        assert!(db.check_generation(first).is_ok());
        scope.commit().unwrap();
        assert!(matches!(
            db.check_generation(first),
            Err(MailDbError::NotInTransaction)
        ));

        let scope = db.begin().unwrap();
        assert!(matches!(
            db.check_generation(first),
            Err(MailDbError::NotInTransaction)
        ));
        scope.commit().unwrap();
    }
}
