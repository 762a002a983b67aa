//! Chained-bucket hash map backing the hash join (spec.md §4.6).
//!
//! Grounded in the reference `hashmap.c`, which buckets by `key % HASHMAP_SIZE`
//! and chains overflow nodes of fixed capacity off the bucket head. The
//! reference has two bugs worth naming: `hashmap_node_create` initializes a
//! node and then discards it by returning a null pointer, and `hashmap_get`
//! returns only the first matching key instead of every position a
//! duplicate key was inserted under. Both are fixed here: chain nodes are
//! owned `Box`es properly linked, and lookups collect every match.

/// One fixed-capacity link in a bucket's overflow chain.
struct BucketNode {
    keys: Vec<i32>,
    positions: Vec<i32>,
    next: Option<Box<BucketNode>>,
}

impl BucketNode {
    fn new(capacity: usize) -> Self {
        BucketNode {
            keys: Vec::with_capacity(capacity),
            positions: Vec::with_capacity(capacity),
            next: None,
        }
    }
}

/// A hash map from `i32` key to every row position inserted under it.
pub struct JoinHashMap {
    buckets: Vec<Option<BucketNode>>,
    bucket_count: usize,
    node_size: usize,
}

impl JoinHashMap {
    pub fn new(bucket_count: usize, node_size: usize) -> Self {
        let mut buckets = Vec::with_capacity(bucket_count);
        buckets.resize_with(bucket_count, || None);
        JoinHashMap {
            buckets,
            bucket_count,
            node_size,
        }
    }

    fn bucket_index(&self, key: i32) -> usize {
        (key as i64).rem_euclid(self.bucket_count as i64) as usize
    }

    pub fn insert(&mut self, key: i32, position: i32) {
        let idx = self.bucket_index(key);
        let node_size = self.node_size;
        let head = self.buckets[idx].get_or_insert_with(|| BucketNode::new(node_size));

        let mut cur = head;
        loop {
            if cur.keys.len() < node_size {
                cur.keys.push(key);
                cur.positions.push(position);
                return;
            }
            if cur.next.is_none() {
                cur.next = Some(Box::new(BucketNode::new(node_size)));
            }
            cur = cur.next.as_mut().unwrap();
        }
    }

    /// Every position inserted under `key`, in insertion order.
    pub fn get_all(&self, key: i32) -> Vec<i32> {
        let idx = self.bucket_index(key);
        let mut out = Vec::new();
        let mut cur = self.buckets[idx].as_ref();
        while let Some(node) = cur {
            for (i, &k) in node.keys.iter().enumerate() {
                if k == key {
                    out.push(node.positions[i]);
                }
            }
            cur = node.next.as_deref();
        }
        out
    }
}
