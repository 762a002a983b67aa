//! The engine handle: replaces the source's process-wide `current_db`
//! global with state owned by an explicit, passable value (spec.md §9).

use crate::config::EngineConfig;
use crate::error::{CsError, CsResult};
use crate::model::{Database, Table};

/// One engine instance. Holds at most one "current" database, mirroring the
/// reference implementation's comment that only one database is ever active
/// at a time, but as explicit state instead of a process global.
#[derive(Debug)]
pub struct Engine {
    pub config: EngineConfig,
    current_db: Option<Database>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            config,
            current_db: None,
        }
    }

    pub fn current_db(&self) -> CsResult<&Database> {
        self.current_db
            .as_ref()
            .ok_or_else(|| CsError::QueryUnsupported("no database is open".to_string()))
    }

    pub fn current_db_mut(&mut self) -> CsResult<&mut Database> {
        self.current_db
            .as_mut()
            .ok_or_else(|| CsError::QueryUnsupported("no database is open".to_string()))
    }

    /// `create(db, name)`: makes `name` the current database, discarding
    /// whatever was previously current (matching the source, which simply
    /// reassigns the single `current_db` pointer).
    pub fn create_database(&mut self, name: impl Into<String>) {
        self.current_db = Some(Database::with_capacity(name, self.config.default_db_tables_capacity));
    }

    /// Installs `db` as current, used by persistence restore.
    pub fn set_current_db(&mut self, db: Database) {
        self.current_db = Some(db);
    }

    /// `create(tbl, name, db, col_count)`.
    pub fn create_table(&mut self, name: impl Into<String>, column_names: &[String]) -> CsResult<()> {
        let capacity = self.config.default_table_capacity;
        let db = self.current_db_mut()?;
        db.create_table(Table::with_capacity(name, column_names, capacity))
    }

    /// Resolve `db.table.column` (or bare `table.column` against the
    /// current database) to its table and column index.
    pub fn resolve_column(&self, qualified: &str) -> CsResult<(&Table, usize)> {
        let parts: Vec<&str> = qualified.split('.').collect();
        let (table_name, col_name) = match parts.as_slice() {
            [t, c] => (*t, *c),
            [_, t, c] => (*t, *c),
            _ => {
                return Err(CsError::IncorrectFormat(format!(
                    "malformed column reference: {qualified}"
                )))
            }
        };
        let db = self.current_db()?;
        let table = db.table(table_name)?;
        let col_idx = table
            .column_index(col_name)
            .ok_or_else(|| CsError::ObjectNotFound(qualified.to_string()))?;
        Ok((table, col_idx))
    }

    pub fn resolve_table_mut(&mut self, qualified: &str) -> CsResult<&mut Table> {
        let table_name = qualified.rsplit('.').next().unwrap_or(qualified);
        let db = self.current_db_mut()?;
        db.table_mut(table_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_db_then_table_then_resolve_column() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.create_database("db1");
        engine
            .create_table("t1", &["a".to_string(), "b".to_string()])
            .unwrap();
        let (table, idx) = engine.resolve_column("db1.t1.a").unwrap();
        assert_eq!(table.name, "t1");
        assert_eq!(idx, 0);
    }

    #[test]
    fn resolve_without_db_fails() {
        let engine = Engine::new(EngineConfig::default());
        assert!(engine.resolve_column("t1.a").is_err());
    }

    #[test]
    fn create_database_replaces_previous() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.create_database("db1");
        engine.create_table("t1", &["a".to_string()]).unwrap();
        engine.create_database("db2");
        assert!(engine.current_db().unwrap().table("t1").is_err());
    }
}
