//! A database: an ordered, named collection of tables.

use crate::error::{CsError, CsResult};
use crate::model::table::Table;

#[derive(Debug, Clone)]
pub struct Database {
    pub name: String,
    pub tables: Vec<Table>,
    /// Table-array capacity, doubling when full (spec.md §4.3/§4.8 growth
    /// policy, persisted per spec.md §6's per-database file).
    pub tables_capacity: usize,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Database::with_capacity(name, 0)
    }

    pub fn with_capacity(name: impl Into<String>, tables_capacity: usize) -> Self {
        Database {
            name: name.into(),
            tables: Vec::with_capacity(tables_capacity),
            tables_capacity,
        }
    }

    pub fn table_index(&self, name: &str) -> Option<usize> {
        self.tables.iter().position(|t| t.name == name)
    }

    pub fn table(&self, name: &str) -> CsResult<&Table> {
        self.table_index(name)
            .map(|i| &self.tables[i])
            .ok_or_else(|| CsError::ObjectNotFound(format!("{}.{name}", self.name)))
    }

    pub fn table_mut(&mut self, name: &str) -> CsResult<&mut Table> {
        match self.table_index(name) {
            Some(i) => Ok(&mut self.tables[i]),
            None => Err(CsError::ObjectNotFound(format!("{}.{name}", self.name))),
        }
    }

    pub fn create_table(&mut self, table: Table) -> CsResult<()> {
        if self.table_index(&table.name).is_some() {
            return Err(CsError::ExecutionError(format!(
                "table {} already exists in {}",
                table.name, self.name
            )));
        }
        if self.tables.len() == self.tables_capacity {
            self.tables_capacity = (self.tables_capacity.max(1)) * 2;
            self.tables.reserve_exact(self.tables_capacity - self.tables.len());
        }
        self.tables.push(table);
        Ok(())
    }
}
