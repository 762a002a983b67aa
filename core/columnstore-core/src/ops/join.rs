//! Equi-join: hash join and nested-loop join (spec.md §4.6).
//!
//! Both strategies emit `(result1, result2)`: each maintained independently
//! in ascending order by insertion-sort at append, as in the reference
//! `insert_to_sorted_data`/`execute_join` (the two outputs are not kept as
//! aligned tuples — each is its own sorted set of matching positions).

use crate::error::{CsError, CsResult};
use crate::joinmap::JoinHashMap;

fn insert_sorted(data: &mut Vec<i32>, val: i32) {
    let at = data.partition_point(|&x| x < val);
    data.insert(at, val);
}

pub fn hash_join(
    vals1: &[i32],
    pos1: &[i32],
    vals2: &[i32],
    pos2: &[i32],
    hashmap_size: usize,
    hashmap_node_size: usize,
) -> CsResult<(Vec<i32>, Vec<i32>)> {
    if vals1.len() != pos1.len() || vals2.len() != pos2.len() {
        return Err(CsError::ExecutionError(
            "join value/position vector length mismatch".to_string(),
        ));
    }

    let mut map = JoinHashMap::new(hashmap_size, hashmap_node_size);
    for (&v, &p) in vals1.iter().zip(pos1.iter()) {
        map.insert(v, p);
    }

    let mut result1 = Vec::new();
    let mut result2 = Vec::new();
    for (&v, &p2) in vals2.iter().zip(pos2.iter()) {
        for p1 in map.get_all(v) {
            insert_sorted(&mut result1, p1);
            insert_sorted(&mut result2, p2);
        }
    }
    Ok((result1, result2))
}

pub fn nested_loop_join(
    vals1: &[i32],
    pos1: &[i32],
    vals2: &[i32],
    pos2: &[i32],
    tile_size: usize,
) -> CsResult<(Vec<i32>, Vec<i32>)> {
    if vals1.len() != pos1.len() || vals2.len() != pos2.len() {
        return Err(CsError::ExecutionError(
            "join value/position vector length mismatch".to_string(),
        ));
    }
    let tile_size = tile_size.max(1);

    let mut result1 = Vec::new();
    let mut result2 = Vec::new();
    let mut i = 0;
    while i < vals1.len() {
        let i_end = (i + tile_size).min(vals1.len());
        let mut j = 0;
        while j < vals2.len() {
            let j_end = (j + tile_size).min(vals2.len());
            for r in i..i_end {
                for m in j..j_end {
                    if vals1[r] == vals2[m] {
                        insert_sorted(&mut result1, pos1[r]);
                        insert_sorted(&mut result2, pos2[m]);
                    }
                }
            }
            j += tile_size;
        }
        i += tile_size;
    }
    Ok((result1, result2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_join_matches_scenario_s5() {
        let vals1 = vec![7, 3, 5, 3];
        let pos1 = vec![0, 1, 2, 3];
        let vals2 = vec![3, 8, 5];
        let pos2 = vec![0, 1, 2];
        let (h1, h2) = hash_join(&vals1, &pos1, &vals2, &pos2, 16, 8).unwrap();
        assert_eq!(h1, vec![1, 2, 3]);
        assert_eq!(h2, vec![0, 0, 2]);
    }

    #[test]
    fn nested_loop_join_matches_hash_join_result() {
        let vals1 = vec![7, 3, 5, 3];
        let pos1 = vec![0, 1, 2, 3];
        let vals2 = vec![3, 8, 5];
        let pos2 = vec![0, 1, 2];
        let (h1, h2) = hash_join(&vals1, &pos1, &vals2, &pos2, 16, 8).unwrap();
        let (n1, n2) = nested_loop_join(&vals1, &pos1, &vals2, &pos2, 2).unwrap();
        assert_eq!(h1, n1);
        assert_eq!(h2, n2);
    }

    #[test]
    fn mismatched_lengths_rejected() {
        assert!(hash_join(&[1, 2], &[0], &[1], &[0], 16, 8).is_err());
        assert!(nested_loop_join(&[1, 2], &[0], &[1], &[0], 16).is_err());
    }

    #[test]
    fn no_matches_yields_empty_results() {
        let (h1, h2) = hash_join(&[1, 2], &[0, 1], &[3, 4], &[0, 1], 16, 8).unwrap();
        assert!(h1.is_empty() && h2.is_empty());
    }
}
