//! Pointer-keyed trees.
//!
//! A pointer key is just a machine word, so this flavor is a thin view
//! over the integer tree at `usize` width: same layout, same descent,
//! the key merely round-trips through the address. Useful for interning
//! tables keyed by object identity.

use std::ptr::NonNull;

use crate::int::IntNode;
use crate::node::{Node, Root, TreeNode};

/// A tree node keyed by a raw pointer value.
///
/// Only the address is ever inspected; the pointee is never dereferenced.
#[derive(Debug)]
#[repr(C)]
pub struct PtrNode {
    node: Node,
    key: *const (),
}

// Same layout as the usize flavor, which carries all the operations.
const _: () =
    assert!(std::mem::size_of::<PtrNode>() == std::mem::size_of::<IntNode<usize>>());

impl PtrNode {
    pub const fn new(key: *const ()) -> PtrNode {
        PtrNode {
            node: Node::new(),
            key,
        }
    }

    #[inline]
    pub fn key(&self) -> *const () {
        self.key
    }

    #[inline]
    pub fn in_tree(&self) -> bool {
        self.node.in_tree()
    }

    #[inline]
    fn as_int(this: NonNull<PtrNode>) -> NonNull<IntNode<usize>> {
        this.cast()
    }

    /// Insert `new`, returning it, or the incumbent when the tree is in
    /// unique mode and the key is already present.
    ///
    /// # Safety
    /// As [`IntNode::insert`].
    pub unsafe fn insert(root: &mut Root, new: NonNull<PtrNode>) -> NonNull<PtrNode> {
        IntNode::insert(root, Self::as_int(new)).cast()
    }

    /// Find the first inserted node with this exact key.
    ///
    /// # Safety
    /// As [`IntNode::lookup`].
    pub unsafe fn lookup(root: &Root, key: *const ()) -> Option<NonNull<PtrNode>> {
        IntNode::lookup(root, key as usize).map(NonNull::cast)
    }

    /// Largest key not above `key`, by address order.
    ///
    /// # Safety
    /// As [`IntNode::lookup`].
    pub unsafe fn lookup_le(root: &Root, key: *const ()) -> Option<NonNull<PtrNode>> {
        IntNode::lookup_le(root, key as usize).map(NonNull::cast)
    }

    /// Smallest key not below `key`, by address order.
    ///
    /// # Safety
    /// As [`IntNode::lookup`].
    pub unsafe fn lookup_ge(root: &Root, key: *const ()) -> Option<NonNull<PtrNode>> {
        IntNode::lookup_ge(root, key as usize).map(NonNull::cast)
    }
}

unsafe impl TreeNode for PtrNode {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_ordering() {
        let mut root = Root::new();
        // Fabricate distinct, ordered key addresses.
        let keys: Vec<*const ()> = (1..=5usize).map(|i| (i * 64) as *const ()).collect();
        let mut nodes: Vec<Box<PtrNode>> =
            keys.iter().map(|&k| Box::new(PtrNode::new(k))).collect();

        unsafe {
            // Insert out of order.
            for idx in [3usize, 0, 4, 1, 2] {
                PtrNode::insert(&mut root, NonNull::from(&mut *nodes[idx]));
            }

            PtrNode::check(&root);

            let mut seen = vec![];
            let mut cur = PtrNode::first(&root);
            while let Some(n) = cur {
                seen.push(n.as_ref().key());
                cur = PtrNode::next(n);
            }
            assert_eq!(seen, keys);

            assert_eq!(
                PtrNode::lookup(&root, keys[2]).unwrap().as_ref().key(),
                keys[2]
            );
            assert!(PtrNode::lookup(&root, 7 as *const ()).is_none());
            assert_eq!(
                PtrNode::lookup_le(&root, 100 as *const ()).unwrap().as_ref().key(),
                keys[0]
            );
            assert_eq!(
                PtrNode::lookup_ge(&root, 300 as *const ()).unwrap().as_ref().key(),
                keys[4]
            );
        }
    }

    #[test]
    fn delete_by_identity() {
        let mut root = Root::new();
        let payload = [0u8; 3];
        let mut nodes: Vec<Box<PtrNode>> = payload
            .iter()
            .map(|p| Box::new(PtrNode::new(p as *const u8 as *const ())))
            .collect();
        unsafe {
            for n in &mut nodes {
                PtrNode::insert(&mut root, NonNull::from(&mut **n));
            }
            let victim = NonNull::from(&mut *nodes[1]);
            PtrNode::delete(victim);
            assert!(!nodes[1].in_tree());
            assert!(PtrNode::lookup(&root, nodes[1].key()).is_none());
            assert!(PtrNode::lookup(&root, nodes[0].key()).is_some());
        }
    }
}
