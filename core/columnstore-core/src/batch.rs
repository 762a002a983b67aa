//! Batched shared-scan scheduler (spec.md §4.5): selects sharing a base
//! vector are bucketed and fused into one tiled pass over that vector;
//! buckets run across a bounded worker pool, writing into worker-private
//! buffers before being installed into the client context.

use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::client_context::ClientContext;
use crate::config::EngineConfig;
use crate::error::{CsError, CsResult};
use crate::index::Bound;
use crate::result::ResultValue;

/// One queued `select` inside an open batch.
#[derive(Clone)]
pub struct PendingSelect {
    pub base: Arc<Vec<i32>>,
    pub pos: Option<Arc<Vec<i32>>>,
    pub bound: Bound,
    pub handle: String,
}

impl PendingSelect {
    pub fn new(base: Arc<Vec<i32>>, pos: Option<Arc<Vec<i32>>>, bound: Bound, handle: impl Into<String>) -> Self {
        PendingSelect {
            base,
            pos,
            bound,
            handle: handle.into(),
        }
    }

    fn shares_source_with(&self, other: &PendingSelect) -> bool {
        Arc::ptr_eq(&self.base, &other.base)
            && match (&self.pos, &other.pos) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
    }
}

/// Groups adjacent same-source selects into buckets of up to
/// `max_shared_per_pass` comparators each (spec.md §4.5). `max_shared_per_pass
/// = 1` (the default, matching the source) disables fusion entirely.
fn bucket_selects(selects: Vec<PendingSelect>, max_shared_per_pass: usize) -> Vec<Vec<PendingSelect>> {
    let max_shared_per_pass = max_shared_per_pass.max(1);
    let mut buckets: Vec<Vec<PendingSelect>> = Vec::new();

    for select in selects {
        if let Some(last) = buckets.last_mut() {
            if last.len() < max_shared_per_pass && last[0].shares_source_with(&select) {
                last.push(select);
                continue;
            }
        }
        buckets.push(vec![select]);
    }
    buckets
}

/// Runs one bucket as a single tiled pass: for every tile of `base`, every
/// comparator in the bucket is evaluated before moving to the next tile, so
/// the tile stays cache-hot across comparators.
fn run_bucket(bucket: &[PendingSelect], tile_size: usize) -> Vec<(String, Vec<i32>)> {
    tracing::trace!(fused = bucket.len(), "shared-scan pass over one bucket");
    let base = &bucket[0].base;
    let pos = &bucket[0].pos;
    let len = pos.as_ref().map_or(base.len(), |p| p.len());
    let tile_size = tile_size.max(1);

    let mut outputs: Vec<Vec<i32>> = vec![Vec::new(); bucket.len()];
    let mut start = 0;
    while start < len {
        let end = (start + tile_size).min(len);
        for i in start..end {
            let (emit, value) = match pos {
                Some(p) => (p[i], base[p[i] as usize]),
                None => (i as i32, base[i]),
            };
            for (select, out) in bucket.iter().zip(outputs.iter_mut()) {
                if select.bound.matches(value) {
                    out.push(emit);
                }
            }
        }
        start = end;
    }

    bucket
        .iter()
        .zip(outputs)
        .map(|(s, out)| (s.handle.clone(), out))
        .collect()
}

/// Executes every queued select, bucketed and parallelized per
/// `config`, installing each result under its handle in `context`.
pub fn execute_batch(selects: Vec<PendingSelect>, config: &EngineConfig, context: &ClientContext) -> CsResult<()> {
    if selects.is_empty() {
        return Ok(());
    }

    let buckets = bucket_selects(selects, config.max_shared_per_pass);
    let tile_size = config.select_vector_size;
    tracing::debug!(bucket_count = buckets.len(), tile_size, "executing batch");

    let pool = ThreadPoolBuilder::new()
        .num_threads(config.max_select_threads.max(1))
        .thread_name(|i| format!("columnstore-select-{i}"))
        .build()
        .map_err(|e| CsError::ExecutionError(format!("failed to create select worker pool: {e}")))?;

    let per_bucket_results: Vec<Vec<(String, Vec<i32>)>> = pool.install(|| {
        buckets
            .par_iter()
            .map(|bucket| run_bucket(bucket, tile_size))
            .collect()
    });

    for bucket_result in per_bucket_results {
        for (handle, positions) in bucket_result {
            context.put(handle, ResultValue::Int(positions));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(lo: Option<i32>, hi: Option<i32>) -> Bound {
        Bound::new(lo, hi)
    }

    #[test]
    fn batched_equivalence_with_serial_selects() {
        let base = Arc::new((0..30).collect::<Vec<i32>>());
        let context = ClientContext::new(8);
        let config = EngineConfig::default();

        let selects = vec![
            PendingSelect::new(base.clone(), None, b(Some(0), Some(10)), "h1"),
            PendingSelect::new(base.clone(), None, b(Some(10), Some(20)), "h2"),
            PendingSelect::new(base.clone(), None, b(Some(20), Some(30)), "h3"),
        ];
        execute_batch(selects, &config, &context).unwrap();

        let h1 = context.get("h1").unwrap();
        let h2 = context.get("h2").unwrap();
        let h3 = context.get("h3").unwrap();
        let mut union: Vec<i32> = [h1, h2, h3]
            .iter()
            .flat_map(|r| r.as_int_slice().unwrap().to_vec())
            .collect();
        union.sort_unstable();
        assert_eq!(union, (0..30).collect::<Vec<i32>>());
    }

    #[test]
    fn fusion_bucket_shares_one_tile_pass() {
        let base = Arc::new(vec![1, 2, 3, 4, 5]);
        let selects = vec![
            PendingSelect::new(base.clone(), None, b(Some(1), Some(3)), "lo"),
            PendingSelect::new(base.clone(), None, b(Some(3), Some(6)), "hi"),
        ];
        let buckets = bucket_selects(selects, 4);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].len(), 2);
    }

    #[test]
    fn max_shared_per_pass_one_disables_fusion() {
        let base = Arc::new(vec![1, 2, 3]);
        let selects = vec![
            PendingSelect::new(base.clone(), None, b(Some(0), Some(2)), "a"),
            PendingSelect::new(base.clone(), None, b(Some(2), Some(4)), "b"),
        ];
        let buckets = bucket_selects(selects, 1);
        assert_eq!(buckets.len(), 2);
    }
}
