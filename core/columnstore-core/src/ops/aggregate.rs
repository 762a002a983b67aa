//! Aggregate and elementwise operators (spec.md §4.6).

use crate::error::{CsError, CsResult};

/// `sum(v)`: accumulates in `i64` so the result can't overflow a 32-bit
/// column's worth of `i32` values.
pub fn sum(v: &[i32]) -> i64 {
    v.iter().map(|&x| x as i64).sum()
}

/// `avg(v)`: `DOUBLE = sum / count`. Empty input averages to `0.0`.
pub fn avg(v: &[i32]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    sum(v) as f64 / v.len() as f64
}

pub fn min(v: &[i32]) -> Option<i32> {
    v.iter().copied().min()
}

pub fn max(v: &[i32]) -> Option<i32> {
    v.iter().copied().max()
}

/// `min(positions, values)`: minimum over `values[positions[i]]`.
pub fn min_over_positions(positions: &[i32], values: &[i32]) -> CsResult<Option<i32>> {
    gather_then(positions, values, |g| g.iter().copied().min())
}

pub fn max_over_positions(positions: &[i32], values: &[i32]) -> CsResult<Option<i32>> {
    gather_then(positions, values, |g| g.iter().copied().max())
}

fn gather_then<T>(positions: &[i32], values: &[i32], f: impl FnOnce(&[i32]) -> T) -> CsResult<T> {
    let gathered = crate::ops::fetch::fetch(values, positions)?;
    Ok(f(&gathered))
}

/// `add(v1, v2)` / `sub(v1, v2)`: elementwise, equal-length required.
pub fn add(v1: &[i32], v2: &[i32]) -> CsResult<Vec<i32>> {
    elementwise(v1, v2, |a, b| a.wrapping_add(b))
}

pub fn sub(v1: &[i32], v2: &[i32]) -> CsResult<Vec<i32>> {
    elementwise(v1, v2, |a, b| a.wrapping_sub(b))
}

fn elementwise(v1: &[i32], v2: &[i32], f: impl Fn(i32, i32) -> i32) -> CsResult<Vec<i32>> {
    if v1.len() != v2.len() {
        return Err(CsError::ExecutionError(format!(
            "elementwise operands have mismatched lengths: {} vs {}",
            v1.len(),
            v2.len()
        )));
    }
    Ok(v1.iter().zip(v2.iter()).map(|(&a, &b)| f(a, b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_and_avg_match_scenario_s1() {
        let v = vec![2, 3, 4];
        assert_eq!(sum(&v), 9);
        assert!((avg(&v) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn sum_does_not_overflow_i32() {
        let v = vec![i32::MAX, i32::MAX, i32::MAX];
        assert_eq!(sum(&v), 3 * i32::MAX as i64);
    }

    #[test]
    fn min_max_over_positions() {
        let values = vec![10, 5, 20, 1];
        let positions = vec![0, 2, 3];
        assert_eq!(min_over_positions(&positions, &values).unwrap(), Some(1));
        assert_eq!(max_over_positions(&positions, &values).unwrap(), Some(20));
    }

    #[test]
    fn add_sub_require_equal_length() {
        assert_eq!(add(&[1, 2], &[10, 20]).unwrap(), vec![11, 22]);
        assert_eq!(sub(&[10, 20], &[1, 2]).unwrap(), vec![9, 18]);
        assert!(add(&[1], &[1, 2]).is_err());
    }
}
