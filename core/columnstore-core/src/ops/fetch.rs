//! Fetch: gather a base vector by positions (spec.md §4.6).

use crate::error::{CsError, CsResult};

pub fn fetch(base: &[i32], positions: &[i32]) -> CsResult<Vec<i32>> {
    let mut out = Vec::with_capacity(positions.len());
    for &p in positions {
        let idx = p as usize;
        let v = *base
            .get(idx)
            .ok_or_else(|| CsError::ExecutionError(format!("fetch position {idx} out of range")))?;
        out.push(v);
    }
    Ok(out)
}
