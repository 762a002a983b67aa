//! Print: build the in-memory frames the server tiles onto the wire
//! (spec.md §4.7/§6). Socket framing itself lives in the server crate;
//! this module only decides single-row vs. multi-row mode and lays out
//! the multi-row tiles.

use crate::error::{CsError, CsResult};
use crate::result::ResultValue;

#[derive(Debug, Clone, PartialEq)]
pub enum PrintFrames {
    /// Every input reported length 1: one `ResultValue` per column, each
    /// carrying its own type code.
    SingleRow(Vec<ResultValue>),
    /// All inputs were `INT` and of equal length: column-major tiles of
    /// `tile_rows` rows by `num_columns` columns; the last tile may be
    /// shorter.
    MultiRow {
        num_columns: usize,
        tile_rows: usize,
        tiles: Vec<Vec<i32>>,
    },
}

pub fn build_print(results: &[ResultValue], tile_rows: usize) -> CsResult<PrintFrames> {
    if results.is_empty() {
        return Err(CsError::ExecutionError("print requires at least one column".to_string()));
    }

    if results.iter().all(|r| r.len() == 1) {
        return Ok(PrintFrames::SingleRow(results.to_vec()));
    }

    let columns: Vec<&[i32]> = results
        .iter()
        .map(|r| {
            r.as_int_slice()
                .ok_or_else(|| CsError::ExecutionError("multi-row print requires every column to be INT".to_string()))
        })
        .collect::<CsResult<_>>()?;

    let len = columns[0].len();
    if columns.iter().any(|c| c.len() != len) {
        return Err(CsError::ExecutionError(
            "multi-row print requires every column to have equal length".to_string(),
        ));
    }

    let num_columns = columns.len();
    let mut tiles = Vec::new();
    let mut start = 0;
    while start < len {
        let end = (start + tile_rows).min(len);
        let rows = end - start;
        let mut tile = Vec::with_capacity(rows * num_columns);
        for col in &columns {
            tile.extend_from_slice(&col[start..end]);
        }
        tiles.push(tile);
        start = end;
    }
    if tiles.is_empty() {
        tiles.push(Vec::new());
    }

    Ok(PrintFrames::MultiRow {
        num_columns,
        tile_rows,
        tiles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_row_mode_for_scalar_aggregates() {
        let results = vec![ResultValue::Long(vec![9]), ResultValue::Double(vec![3.0])];
        let frames = build_print(&results, 512).unwrap();
        assert_eq!(frames, PrintFrames::SingleRow(results));
    }

    #[test]
    fn multi_row_mode_tiles_column_major() {
        let a = ResultValue::Int(vec![1, 2, 3]);
        let b = ResultValue::Int(vec![10, 20, 30]);
        let frames = build_print(&[a, b], 2).unwrap();
        match frames {
            PrintFrames::MultiRow { num_columns, tiles, .. } => {
                assert_eq!(num_columns, 2);
                assert_eq!(tiles.len(), 2);
                assert_eq!(tiles[0], vec![1, 2, 10, 20]);
                assert_eq!(tiles[1], vec![3, 30]);
            }
            _ => panic!("expected multi-row frames"),
        }
    }

    #[test]
    fn multi_row_rejects_non_int_column() {
        let results = vec![ResultValue::Int(vec![1, 2]), ResultValue::Double(vec![1.0, 2.0])];
        assert!(build_print(&results, 512).is_err());
    }

    #[test]
    fn multi_row_rejects_mismatched_lengths() {
        let results = vec![ResultValue::Int(vec![1, 2]), ResultValue::Int(vec![1, 2, 3])];
        assert!(build_print(&results, 512).is_err());
    }
}
