//! B+tree secondary index: leaf-linked, clustered and unclustered insert.
//!
//! Nodes live in a flat arena (`nodes`) addressed by index instead of by
//! pointer, so a leaf's `next` sibling is just another arena slot — no
//! unsafe, no back-references, and node 0 (the very first leaf ever
//! allocated) is always the leftmost leaf: splits only ever push new nodes
//! to the right, they never relocate an existing one.

use super::Bound;

#[derive(Debug, Clone)]
struct LeafNode {
    keys: Vec<i32>,
    positions: Vec<i32>,
    next: Option<usize>,
}

#[derive(Debug, Clone)]
struct InternalNode {
    keys: Vec<i32>,
    children: Vec<usize>,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(LeafNode),
    Internal(InternalNode),
}

impl Node {
    fn num_keys(&self) -> usize {
        match self {
            Node::Leaf(l) => l.keys.len(),
            Node::Internal(n) => n.keys.len(),
        }
    }
}

/// Leftmost index `pos` in `keys` such that `keys[pos] >= val`, or
/// `keys.len()` if every key is smaller.
fn find_key_pos(keys: &[i32], val: i32) -> usize {
    keys.iter().position(|&k| k >= val).unwrap_or(keys.len())
}

#[derive(Debug, Clone)]
pub struct BtreeIndex {
    max_keys: usize,
    nodes: Vec<Node>,
    root: usize,
}

impl BtreeIndex {
    pub fn new(max_keys: usize) -> Self {
        BtreeIndex {
            max_keys: max_keys.max(2),
            nodes: vec![Node::Leaf(LeafNode {
                keys: Vec::new(),
                positions: Vec::new(),
                next: None,
            })],
            root: 0,
        }
    }

    /// Insert `val` into the clustered index; returns the rank it landed at.
    pub fn insert_clustered(&mut self, val: i32) -> usize {
        let (split, rank) = self.insert_clustered_node(self.root, val);
        if let Some((median, new_idx)) = split {
            self.new_root(median, new_idx);
        }
        rank
    }

    /// Insert `(val, orig_pos)` into the unclustered index. When `last` is
    /// false, every stored position `>= orig_pos` is bumped by one first,
    /// reflecting a mid-column shift in the owning column's data.
    pub fn insert_unclustered(&mut self, val: i32, orig_pos: usize, last: bool) {
        if !last {
            self.bump_positions_from(orig_pos);
        }
        if let Some((median, new_idx)) = self.insert_unclustered_leaf_path(self.root, val, orig_pos) {
            self.new_root(median, new_idx);
        }
    }

    fn new_root(&mut self, median: i32, right: usize) {
        let new_idx = self.nodes.len();
        self.nodes.push(Node::Internal(InternalNode {
            keys: vec![median],
            children: vec![self.root, right],
        }));
        self.root = new_idx;
    }

    fn bump_positions_from(&mut self, orig_pos: usize) {
        let mut cur = Some(0usize); // node 0 is always the leftmost leaf
        while let Some(idx) = cur {
            let Node::Leaf(leaf) = &mut self.nodes[idx] else {
                unreachable!("leaf chain must only contain leaves")
            };
            for p in leaf.positions.iter_mut() {
                if *p as usize >= orig_pos {
                    *p += 1;
                }
            }
            cur = leaf.next;
        }
    }

    /// Returns `Some((median, new_right_node_idx))` if `idx` split.
    fn insert_clustered_node(&mut self, idx: usize, val: i32) -> (Option<(i32, usize)>, usize) {
        let is_leaf = matches!(self.nodes[idx], Node::Leaf(_));
        let rank = if is_leaf {
            let Node::Leaf(leaf) = &mut self.nodes[idx] else {
                unreachable!()
            };
            let first_pos = if leaf.keys.is_empty() {
                0
            } else {
                leaf.positions[0] as usize
            };
            let mut i = leaf.keys.len();
            while i > 0 && leaf.keys[i - 1] > val {
                i -= 1;
            }
            leaf.keys.insert(i, val);
            leaf.positions.insert(i, 0);
            let n = leaf.keys.len();
            for k in i..n {
                leaf.positions[k] = (first_pos + k) as i32;
            }
            let next = leaf.next;
            let rank = first_pos + i;
            drop(leaf);
            let mut cur = next;
            while let Some(nidx) = cur {
                let Node::Leaf(l2) = &mut self.nodes[nidx] else {
                    unreachable!()
                };
                for p in l2.positions.iter_mut() {
                    *p += 1;
                }
                cur = l2.next;
            }
            rank
        } else {
            let key_pos = {
                let Node::Internal(node) = &self.nodes[idx] else {
                    unreachable!()
                };
                find_key_pos(&node.keys, val)
            };
            let child_idx = {
                let Node::Internal(node) = &self.nodes[idx] else {
                    unreachable!()
                };
                node.children[key_pos]
            };
            let (split, rank) = self.insert_clustered_node(child_idx, val);
            if let Some((median, new_child_idx)) = split {
                let Node::Internal(node) = &mut self.nodes[idx] else {
                    unreachable!()
                };
                node.keys.insert(key_pos, median);
                node.children.insert(key_pos + 1, new_child_idx);
            }
            rank
        };

        if self.nodes[idx].num_keys() == self.max_keys {
            (Some(self.split_node(idx, is_leaf)), rank)
        } else {
            (None, rank)
        }
    }

    fn insert_unclustered_leaf_path(
        &mut self,
        idx: usize,
        val: i32,
        orig_pos: usize,
    ) -> Option<(i32, usize)> {
        let is_leaf = matches!(self.nodes[idx], Node::Leaf(_));
        if is_leaf {
            let Node::Leaf(leaf) = &mut self.nodes[idx] else {
                unreachable!()
            };
            let mut i = leaf.keys.len();
            while i > 0 && leaf.keys[i - 1] > val {
                i -= 1;
            }
            leaf.keys.insert(i, val);
            leaf.positions.insert(i, orig_pos as i32);
        } else {
            let key_pos = {
                let Node::Internal(node) = &self.nodes[idx] else {
                    unreachable!()
                };
                find_key_pos(&node.keys, val)
            };
            let child_idx = {
                let Node::Internal(node) = &self.nodes[idx] else {
                    unreachable!()
                };
                node.children[key_pos]
            };
            if let Some((median, new_child_idx)) =
                self.insert_unclustered_leaf_path(child_idx, val, orig_pos)
            {
                let Node::Internal(node) = &mut self.nodes[idx] else {
                    unreachable!()
                };
                node.keys.insert(key_pos, median);
                node.children.insert(key_pos + 1, new_child_idx);
            }
        }

        if self.nodes[idx].num_keys() == self.max_keys {
            Some(self.split_node(idx, is_leaf))
        } else {
            None
        }
    }

    /// Splits node `idx` in place and returns `(median, new_right_idx)`.
    /// Leaf splits copy the median into the right leaf (textbook B+tree leaf
    /// behavior); internal splits remove the median from both sides and
    /// promote it, per spec.md §9's resolution of the ambiguous source.
    fn split_node(&mut self, idx: usize, is_leaf: bool) -> (i32, usize) {
        if is_leaf {
            let (next, right_keys, right_positions) = {
                let Node::Leaf(leaf) = &mut self.nodes[idx] else {
                    unreachable!()
                };
                let mid = leaf.keys.len() / 2;
                let next = leaf.next;
                (next, leaf.keys.split_off(mid), leaf.positions.split_off(mid))
            };
            let median = right_keys[0];
            let new_idx = self.nodes.len();
            self.nodes.push(Node::Leaf(LeafNode {
                keys: right_keys,
                positions: right_positions,
                next,
            }));
            let Node::Leaf(leaf) = &mut self.nodes[idx] else {
                unreachable!()
            };
            leaf.next = Some(new_idx);
            (median, new_idx)
        } else {
            let (median, right_keys, right_children) = {
                let Node::Internal(node) = &mut self.nodes[idx] else {
                    unreachable!()
                };
                let mid = node.keys.len() / 2;
                let median = node.keys[mid];
                let right_keys = node.keys.split_off(mid + 1);
                node.keys.truncate(mid);
                let right_children = node.children.split_off(mid + 1);
                (median, right_keys, right_children)
            };
            let new_idx = self.nodes.len();
            self.nodes.push(Node::Internal(InternalNode {
                keys: right_keys,
                children: right_children,
            }));
            (median, new_idx)
        }
    }

    fn leaf_for(&self, val: i32) -> usize {
        let mut cur = self.root;
        loop {
            match &self.nodes[cur] {
                Node::Leaf(_) => return cur,
                Node::Internal(node) => {
                    let pos = find_key_pos(&node.keys, val);
                    cur = node.children[pos];
                }
            }
        }
    }

    /// Range scan `[lower, upper)`, appending matching positions in linked
    /// leaf order; stops as soon as a key `>= upper` is seen.
    pub fn range_scan(&self, bound: Bound, out: &mut Vec<i32>) {
        let start_leaf = self.leaf_for(bound.lower.unwrap_or(i32::MIN));
        let mut cur = Some(start_leaf);
        'outer: while let Some(idx) = cur {
            let Node::Leaf(leaf) = &self.nodes[idx] else {
                unreachable!()
            };
            for (i, &key) in leaf.keys.iter().enumerate() {
                if let Some(lo) = bound.lower {
                    if key < lo {
                        continue;
                    }
                }
                if let Some(hi) = bound.upper {
                    if key >= hi {
                        break 'outer;
                    }
                }
                out.push(leaf.positions[i]);
            }
            cur = leaf.next;
        }
    }

    /// Left-to-right traversal of linked leaves, writing keys in sort order.
    pub fn enumerate_keys(&self, out: &mut Vec<i32>) {
        let mut cur = Some(0usize);
        while let Some(idx) = cur {
            let Node::Leaf(leaf) = &self.nodes[idx] else {
                unreachable!()
            };
            out.extend_from_slice(&leaf.keys);
            cur = leaf.next;
        }
    }

    /// Number of keys reachable by walking the leaf chain — used by tests
    /// to check the traversal invariant (§8 property 3).
    #[cfg(test)]
    pub fn count_via_leaves(&self) -> usize {
        let mut out = Vec::new();
        self.enumerate_keys(&mut out);
        out.len()
    }
}
