//! Shape and memory statistics.
//!
//! Nothing here is needed for correctness; it exists to answer "what
//! does this tree look like" questions when tuning a client. Population
//! memory is whatever the caller allocated; this module only counts it.

use std::mem::size_of;

use humansize::{file_size_opts, FileSize};
use smallvec::SmallVec;

use crate::link::{Link, LEAF, LEFT, RIGHT};
use crate::node::{Root, TreeNode};

/// Aggregate shape statistics for one tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Stored items (every one of them is a leaf).
    pub leaves: usize,
    /// Inner roles in use; always `leaves - 1` on a populated tree.
    pub inner_nodes: usize,
    /// Inner roles spent on duplicate chains.
    pub dup_nodes: usize,
    /// Longest root-to-leaf path, in edges.
    pub max_depth: usize,
}

/// Walk the tree once and collect its [`TreeStats`].
///
/// # Safety
/// Every node linked under `root` must be live.
pub unsafe fn tree_stats(root: &Root) -> TreeStats {
    let mut stats = TreeStats::default();
    let top = root.branches.b[LEFT];
    if top.addr_is_null() {
        return stats;
    }

    let mut stack: SmallVec<[(Link, usize); 32]> = SmallVec::new();
    stack.push((top, 0));
    while let Some((link, depth)) = stack.pop() {
        stats.max_depth = stats.max_depth.max(depth);
        let node = link.node();
        if link.tag() == LEAF {
            stats.leaves += 1;
            continue;
        }
        stats.inner_nodes += 1;
        if node.as_ref().bit < 0 {
            stats.dup_nodes += 1;
        }
        stack.push((node.as_ref().branches.b[LEFT], depth + 1));
        stack.push((node.as_ref().branches.b[RIGHT], depth + 1));
    }
    stats
}

impl TreeStats {
    /// Caller-side memory the tree occupies when every item is a `T`.
    pub fn memory_for<T: TreeNode>(&self) -> usize {
        size_of::<Root>() + self.leaves * size_of::<T>()
    }
}

/// Print a short report about the tree, sized as if every stored item
/// were a `T`.
///
/// # Safety
/// As [`tree_stats`].
#[allow(unused)]
pub unsafe fn print_stats<T: TreeNode>(root: &Root, name: &str) {
    let stats = tree_stats(root);
    println!("-------- tree {} --------", name);
    println!(
        "{} leaves, {} inner nodes in use ({} on duplicate chains)",
        stats.leaves, stats.inner_nodes, stats.dup_nodes
    );
    println!("max depth {}", stats.max_depth);
    println!(
        "{} byte items, {} total",
        size_of::<T>(),
        stats
            .memory_for::<T>()
            .file_size(file_size_opts::CONVENTIONAL)
            .unwrap()
    );
}
