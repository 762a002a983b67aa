//! A table: a fixed sequence of same-length columns, at most one clustered.

use crate::error::{CsError, CsResult};
use crate::model::column::Column;

/// A named container of columns, created once at a fixed column count.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    /// Current row count — invariant 1: every column's `len()` equals this.
    pub length: usize,
    /// Row slots reserved in each column; doubles when `length` would
    /// exceed it (spec.md §4.3 `ensure_capacity`, persisted in the per-table
    /// catalog file per spec.md §6).
    pub capacity: usize,
    /// Index into `columns` of the clustering column, if any.
    pub index_column: Option<usize>,
}

impl Table {
    pub fn new(name: impl Into<String>, column_names: &[String]) -> Self {
        Table::with_capacity(name, column_names, 0)
    }

    pub fn with_capacity(name: impl Into<String>, column_names: &[String], capacity: usize) -> Self {
        let columns: Vec<Column> = column_names
            .iter()
            .map(|n| {
                let mut c = Column::new(n.as_str());
                c.data.reserve_exact(capacity);
                c
            })
            .collect();
        Table {
            name: name.into(),
            columns,
            length: 0,
            capacity,
            index_column: None,
        }
    }

    /// Doubles `capacity` (starting from 1) until it can hold `new_len`,
    /// reserving the growth in every column's backing storage.
    fn ensure_capacity(&mut self, new_len: usize) {
        if new_len <= self.capacity {
            return;
        }
        let mut capacity = self.capacity.max(1);
        while capacity < new_len {
            capacity *= 2;
        }
        for col in self.columns.iter_mut() {
            col.data.reserve_exact(capacity - col.data.len());
        }
        self.capacity = capacity;
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> CsResult<&Column> {
        self.column_index(name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| CsError::ObjectNotFound(format!("{}.{name}", self.name)))
    }

    /// Insert one row, `values[i]` landing in `columns[i]`.
    ///
    /// Drives the per-row path of spec.md §4.3: when the table has a
    /// clustering column, its index determines the insertion rank and every
    /// other column (and any index it carries) shifts to match; otherwise
    /// every column just appends.
    pub fn insert_row(&mut self, values: &[i32]) -> CsResult<()> {
        if values.len() != self.columns.len() {
            return Err(CsError::IncorrectFormat(format!(
                "expected {} values, got {}",
                self.columns.len(),
                values.len()
            )));
        }

        self.ensure_capacity(self.length + 1);

        match self.index_column {
            Some(idx_col) => {
                let rank = self.columns[idx_col].insert_clustering_value(values[idx_col]);
                for (i, col) in self.columns.iter_mut().enumerate() {
                    if i == idx_col {
                        continue;
                    }
                    col.insert_at_rank(values[i], rank);
                }
            }
            None => {
                for (i, col) in self.columns.iter_mut().enumerate() {
                    col.append(values[i]);
                }
            }
        }

        self.length += 1;
        Ok(())
    }

    /// Designate `column_index` as the clustering column. Builds its index
    /// by replaying existing values in physical row order, matching the
    /// post-state of per-row insertion (spec.md lifecycle: "if data already
    /// present, built by inserting the existing values in order").
    pub fn set_clustering_column(&mut self, column_index: usize, max_node_keys: usize, use_btree: bool) {
        debug_assert!(self.index_column.is_none(), "at most one clustering column");
        let existing: Vec<i32> = self.columns[column_index].data.clone();
        self.columns[column_index].clustered = true;
        self.columns[column_index].index = Some(if use_btree {
            crate::index::ColumnIndex::new_btree(max_node_keys)
        } else {
            crate::index::ColumnIndex::new_sorted()
        });
        self.index_column = Some(column_index);

        if existing.is_empty() {
            return;
        }

        // Replay existing values through the fresh index purely to leave it
        // populated; the resulting physical order is derived independently
        // below via a stable sort, since rank-as-you-go would require
        // shifting every other column in lockstep mid-loop.
        {
            let index = self.columns[column_index]
                .index
                .as_mut()
                .expect("just attached");
            for v in existing.iter().copied() {
                index.insert_clustered(v);
            }
        }

        // Stable sort by value, tie-broken by original insertion order
        // (matches invariant 1's tie-break rule), giving the final physical
        // row order every column must be reordered to.
        let mut indexed: Vec<(i32, usize)> = existing.iter().copied().zip(0..).collect();
        indexed.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        let new_order: Vec<usize> = indexed.iter().map(|(_, orig)| *orig).collect();

        for (ci, col) in self.columns.iter_mut().enumerate() {
            let reordered: Vec<i32> = new_order.iter().map(|&orig| col.data[orig]).collect();
            col.data = reordered;
            if ci != column_index {
                if let Some(index) = &mut col.index {
                    // rebuild any secondary index on a non-clustering column
                    // from scratch against the new physical order.
                    let data = col.data.clone();
                    *index = match index {
                        crate::index::ColumnIndex::Sorted(_) => crate::index::ColumnIndex::new_sorted(),
                        crate::index::ColumnIndex::Btree(_) => crate::index::ColumnIndex::new_btree(max_node_keys),
                    };
                    for (pos, v) in data.iter().enumerate() {
                        index.insert_unclustered(*v, pos, true);
                    }
                }
            }
        }
    }

    /// Attach a secondary index to an already-populated, non-clustering
    /// column, built by replaying its current values in physical order.
    pub fn create_secondary_index(&mut self, column_index: usize, max_node_keys: usize, use_btree: bool) {
        let col = &mut self.columns[column_index];
        let mut index = if use_btree {
            crate::index::ColumnIndex::new_btree(max_node_keys)
        } else {
            crate::index::ColumnIndex::new_sorted()
        };
        for (pos, v) in col.data.clone().iter().enumerate() {
            index.insert_unclustered(*v, pos, true);
        }
        col.index = Some(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn insert_row_without_clustering_appends() {
        let mut t = Table::new("t1", &names(&["a", "b"]));
        t.insert_row(&[1, 10]).unwrap();
        t.insert_row(&[3, 30]).unwrap();
        t.insert_row(&[2, 20]).unwrap();
        assert_eq!(t.columns[0].data, vec![1, 3, 2]);
        assert_eq!(t.columns[1].data, vec![10, 30, 20]);
        assert_eq!(t.length, 3);
    }

    #[test]
    fn insert_row_with_clustering_sorts_all_columns() {
        let mut t = Table::new("t1", &names(&["a", "b"]));
        t.set_clustering_column(0, 1024, false);
        t.insert_row(&[1, 10]).unwrap();
        t.insert_row(&[3, 30]).unwrap();
        t.insert_row(&[2, 20]).unwrap();
        t.insert_row(&[5, 50]).unwrap();
        t.insert_row(&[4, 40]).unwrap();
        assert_eq!(t.columns[0].data, vec![1, 2, 3, 4, 5]);
        assert_eq!(t.columns[1].data, vec![10, 20, 30, 40, 50]);
    }

    #[test]
    fn wrong_arity_rejected() {
        let mut t = Table::new("t1", &names(&["a", "b"]));
        assert!(t.insert_row(&[1]).is_err());
    }

    #[test]
    fn set_clustering_column_on_populated_table_reorders() {
        let mut t = Table::new("t1", &names(&["a", "b"]));
        t.insert_row(&[5, 50]).unwrap();
        t.insert_row(&[1, 10]).unwrap();
        t.insert_row(&[3, 30]).unwrap();
        t.set_clustering_column(0, 1024, true);
        assert_eq!(t.columns[0].data, vec![1, 3, 5]);
        assert_eq!(t.columns[1].data, vec![10, 30, 50]);
    }
}
