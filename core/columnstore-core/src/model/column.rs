//! A single dense integer column, with an optional attached secondary index.

use crate::index::{Bound, ColumnIndex};

/// One column of a table: a dense `i32` vector plus an optional index.
///
/// A column never stores a pointer back to its owning table — callers pass
/// `&Table`/`&mut Table` explicitly where table-level context (row count,
/// which column is the clustering key) is needed. This sidesteps the
/// `Column -> Table -> Column` ownership cycle entirely instead of working
/// around it with weak references or unsafe back-pointers.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub data: Vec<i32>,
    pub index: Option<ColumnIndex>,
    pub clustered: bool,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            data: Vec::new(),
            index: None,
            clustered: false,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Insert `value` at clustered rank `rank`, shifting everything after it
    /// down by one. Used on the clustering column (which determines `rank`
    /// via its own index) and then mirrored onto every other column of the
    /// same table at the same `rank`.
    pub fn insert_at_rank(&mut self, value: i32, rank: usize) {
        self.data.insert(rank, value);
        if let Some(index) = &mut self.index {
            // non-clustering columns of a clustered table still need their
            // own unclustered index kept in sync with the physical shift.
            index.insert_unclustered(value, rank, false);
        }
    }

    /// Append `value`, for a table with no clustering column.
    pub fn append(&mut self, value: i32) {
        let pos = self.data.len();
        self.data.push(value);
        if let Some(index) = &mut self.index {
            index.insert_unclustered(value, pos, true);
        }
    }

    /// Insert `value` into the clustering column itself; returns the rank
    /// the index assigned it (spec.md §4.3).
    pub fn insert_clustering_value(&mut self, value: i32) -> usize {
        let index = self
            .index
            .as_mut()
            .expect("clustering column must carry an index");
        let rank = index.insert_clustered(value);
        self.data.insert(rank, value);
        rank
    }

    pub fn range_scan(&self, bound: Bound, out: &mut Vec<i32>) {
        match &self.index {
            Some(index) => index.range_scan(bound, out),
            None => {
                for (i, &v) in self.data.iter().enumerate() {
                    if bound.matches(v) {
                        out.push(i as i32);
                    }
                }
            }
        }
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }
}
