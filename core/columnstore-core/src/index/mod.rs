//! Secondary indexes attachable to a column: sorted parallel arrays or a
//! leaf-linked B+tree, each clustered or unclustered.

mod btree;
mod sorted;

pub use btree::BtreeIndex;
pub use sorted::SortedIndex;

/// A half-open range `[lower, upper)`; either side absent means unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bound {
    pub lower: Option<i32>,
    pub upper: Option<i32>,
}

impl Bound {
    pub fn new(lower: Option<i32>, upper: Option<i32>) -> Self {
        Bound { lower, upper }
    }

    pub fn matches(&self, v: i32) -> bool {
        self.lower.is_none_or(|lo| v >= lo) && self.upper.is_none_or(|hi| v < hi)
    }
}

/// The kind of secondary index a column may carry, and whether it is the
/// table's clustering index (its key order is the table's physical row
/// order) or a plain unclustered secondary index.
#[derive(Debug, Clone)]
pub enum ColumnIndex {
    Sorted(SortedIndex),
    Btree(BtreeIndex),
}

impl ColumnIndex {
    pub fn new_sorted() -> Self {
        ColumnIndex::Sorted(SortedIndex::new())
    }

    pub fn new_btree(max_node_keys: usize) -> Self {
        ColumnIndex::Btree(BtreeIndex::new(max_node_keys))
    }

    pub fn insert_clustered(&mut self, val: i32) -> usize {
        match self {
            ColumnIndex::Sorted(s) => s.insert_clustered(val),
            ColumnIndex::Btree(b) => b.insert_clustered(val),
        }
    }

    pub fn insert_unclustered(&mut self, val: i32, orig_pos: usize, last: bool) {
        match self {
            ColumnIndex::Sorted(s) => s.insert_unclustered(val, orig_pos, last),
            ColumnIndex::Btree(b) => b.insert_unclustered(val, orig_pos, last),
        }
    }

    pub fn range_scan(&self, bound: Bound, out: &mut Vec<i32>) {
        match self {
            ColumnIndex::Sorted(s) => s.range_scan(bound, out),
            ColumnIndex::Btree(b) => b.range_scan(bound, out),
        }
    }

    pub fn enumerate_keys(&self, out: &mut Vec<i32>) {
        match self {
            ColumnIndex::Sorted(s) => s.enumerate_keys(out),
            ColumnIndex::Btree(b) => b.enumerate_keys(out),
        }
    }
}
