//! Elastic binary trees: ordered, intrusive radix trees.
//!
//! An elastic binary tree maps integer, pointer or byte-string keys to
//! caller-owned nodes. Work per operation is bounded by the key width
//! rather than the population, deletion is O(1), traversal is stateless,
//! and equal keys can coexist (enumerated in insertion order). That
//! trade-off suits schedulers, timer queues and connection tables, where
//! unlink-from-anywhere and cheap ordered scans matter more than perfect
//! balance.
//!
//! The library never allocates: every stored item embeds a node header
//! and is owned, placed and freed by the caller. In exchange, the
//! pointer-taking operations are `unsafe` and the caller keeps three
//! promises: a linked node does not move, is not dropped, and one tree is
//! not mutated concurrently. No synchronization is performed; wrap the
//! tree in a lock if you share it.
//!
//! ```
//! use std::ptr::NonNull;
//! use ebtree::{IntNode, Root, TreeNode};
//!
//! let mut root = Root::new();
//! let mut timers: Vec<Box<IntNode<u32>>> =
//!     [30u32, 10, 20].iter().map(|&k| Box::new(IntNode::new(k))).collect();
//!
//! unsafe {
//!     for t in &mut timers {
//!         IntNode::insert(&mut root, NonNull::from(&mut **t));
//!     }
//!
//!     // Expiry scan: smallest deadline first.
//!     let first = IntNode::<u32>::first(&root).unwrap();
//!     assert_eq!(first.as_ref().key(), 10);
//!
//!     // A timer can be cancelled from anywhere, in O(1).
//!     IntNode::delete(first);
//!     assert_eq!(IntNode::<u32>::first(&root).unwrap().as_ref().key(), 20);
//! }
//! ```
//!
//! Key flavors: [`IntNode`] for fixed-width integers (`u32`/`u64`/`u128`
//! and their signed twins, which sort in two's-complement order),
//! [`PtrNode`] for pointer identity, [`BytesNode`] for fixed-length byte
//! strings with an optional longest-prefix-match mode, and [`StrNode`]
//! for NUL-terminated strings held by pointer.

pub use int::{IntKey, IntNode};
pub use iter::{Iter, UniqueIter};
pub use metrics::{print_stats, tree_stats, TreeStats};
pub use node::{Node, Root, TreeNode};

pub use bytes::BytesNode;
pub use istr::StrNode;
pub use ptr::PtrNode;

mod bits;
mod bytes;
mod debug;
mod int;
mod istr;
mod iter;
mod link;
mod metrics;
mod node;
mod ptr;

pub use debug::print_tree;
