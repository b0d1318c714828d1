//! String-keyed trees, with the key held by pointer.
//!
//! The node stores only a pointer to a NUL-terminated key owned by the
//! caller; layout-wise this is the pointer flavor, but descent compares
//! the referenced bytes. The terminator takes part in every comparison,
//! which is what makes variable-length keys unambiguous: a string and
//! its proper prefix always differ where one of them ends.

use std::ffi::CStr;
use std::os::raw::c_char;
use std::ptr::{addr_of_mut, NonNull};

use crate::bits::{cmp_bits, get_bit, string_equal_bits};
use crate::link::{Link, INNER, LEAF, LEFT, RIGHT};
use crate::node::{walk_down, Branches, Node, Root, TreeNode};

/// A tree node keyed by a NUL-terminated string it does not own.
#[derive(Debug)]
#[repr(C)]
pub struct StrNode {
    node: Node,
    key: *const c_char,
}

impl StrNode {
    /// The node borrows `key`'s buffer without a lifetime: the caller
    /// must keep it alive and unchanged while the node is linked.
    pub fn new(key: &CStr) -> StrNode {
        StrNode {
            node: Node::new(),
            key: key.as_ptr(),
        }
    }

    /// # Safety
    /// The key buffer handed to [`StrNode::new`] must still be live.
    #[inline]
    pub unsafe fn key<'a>(&self) -> &'a CStr {
        CStr::from_ptr(self.key)
    }

    #[inline]
    pub fn in_tree(&self) -> bool {
        self.node.in_tree()
    }

    /// The key bytes including the terminator, the unit every bit-level
    /// helper works on.
    #[inline]
    unsafe fn key_bytes<'a>(this: NonNull<StrNode>) -> &'a [u8] {
        CStr::from_ptr(this.as_ref().key).to_bytes_with_nul()
    }

    /// Insert `new`, returning it, or the incumbent when the tree is in
    /// unique mode and an equal string is already present.
    ///
    /// # Safety
    /// As [`IntNode::insert`](crate::IntNode::insert), with `StrNode`s
    /// throughout; additionally every linked node's key buffer must be
    /// live.
    pub unsafe fn insert(root: &mut Root, new: NonNull<StrNode>) -> NonNull<StrNode> {
        let newp = new.as_ptr();

        let mut side = LEFT;
        let mut troot = root.branches.b[LEFT];
        let root_right = root.branches.b[RIGHT];
        if troot.is_none() {
            let root_branches = NonNull::from(&root.branches);
            (*root_branches.as_ptr()).b[LEFT] = Link::new(new.cast(), LEAF);
            (*newp).node.leaf_p = Link::new(root_branches, LEFT);
            (*newp).node.node_p = Link::NONE;
            return new;
        }

        let newkey = Self::key_bytes(new);
        let mut parent = NonNull::from(&root.branches);
        // Count of leading bits known equal; negative once the needle has
        // matched a whole key through its terminator, after which there is
        // nothing left to compare.
        let mut bit: i32 = 0;
        let old: NonNull<StrNode>;
        let up_ptr: *mut Link;

        loop {
            if troot.tag() == LEAF {
                old = troot.node().cast();
                (*newp).node.node_p = old.as_ref().node.leaf_p;
                up_ptr = addr_of_mut!((*old.as_ptr()).node.leaf_p);
                if bit >= 0 {
                    bit = string_equal_bits(newkey, Self::key_bytes(old), bit);
                }
                break;
            }

            let cur: NonNull<StrNode> = troot.node().cast();
            let onb = cur.as_ref().node.bit;

            if onb < 0 {
                old = cur;
                (*newp).node.node_p = old.as_ref().node.node_p;
                up_ptr = addr_of_mut!((*old.as_ptr()).node.node_p);
                if bit >= 0 {
                    bit = string_equal_bits(newkey, Self::key_bytes(old), bit);
                }
                break;
            }

            if bit >= 0 {
                bit = string_equal_bits(newkey, Self::key_bytes(cur), bit);
                if bit >= 0 && bit < onb {
                    // Diverged above this node's split point.
                    old = cur;
                    (*newp).node.node_p = old.as_ref().node.node_p;
                    up_ptr = addr_of_mut!((*old.as_ptr()).node.node_p);
                    break;
                }
                if bit > onb {
                    // Bits past the split were checked against a key from
                    // one branch only; don't let them stand for the other.
                    bit = onb;
                }
            }

            parent = Node::branches_ptr(troot.node());
            side = get_bit(newkey, onb);
            troot = cur.as_ref().node.branches.b[side];
        }

        let new_branches: NonNull<Branches> = new.cast();
        let new_left = Link::new(new_branches, LEFT);
        let new_right = Link::new(new_branches, RIGHT);
        let new_leaf = Link::new(new_branches, LEAF);

        let diff = if bit < 0 {
            0
        } else {
            cmp_bits(newkey, Self::key_bytes(old), bit)
        };

        (*newp).node.bit = bit;

        if diff == 0 {
            (*newp).node.bit = -1;

            if root_right.tag() == 1 {
                (*newp).node.node_p = Link::NONE;
                return old;
            }
            if troot.tag() != LEAF {
                return Node::insert_dup(old.cast(), new.cast()).cast();
            }
        }

        if diff >= 0 {
            (*newp).node.branches.b[LEFT] = troot;
            (*newp).node.branches.b[RIGHT] = new_leaf;
            (*newp).node.leaf_p = new_right;
            *up_ptr = new_left;
        } else {
            (*newp).node.branches.b[LEFT] = new_leaf;
            (*newp).node.branches.b[RIGHT] = troot;
            (*newp).node.leaf_p = new_left;
            *up_ptr = new_right;
        }

        (*parent.as_ptr()).b[side] = Link::new(new_branches, INNER);
        new
    }

    /// Find the first inserted node whose string equals `key`.
    ///
    /// # Safety
    /// Every node linked under `root` must be a live `StrNode` with a
    /// live key buffer.
    pub unsafe fn lookup(root: &Root, key: &CStr) -> Option<NonNull<StrNode>> {
        let x = key.to_bytes_with_nul();
        let mut troot = root.branches.b[LEFT];
        if troot.is_none() {
            return None;
        }

        let mut bit: i32 = 0;
        loop {
            if troot.tag() == LEAF {
                let node: NonNull<StrNode> = troot.node().cast();
                return (Self::key_bytes(node) == x).then_some(node);
            }

            let node: NonNull<StrNode> = troot.node().cast();
            let onb = node.as_ref().node.bit;

            if onb < 0 {
                if Self::key_bytes(node) != x {
                    return None;
                }
                let leaf = walk_down(node.as_ref().node.branches.b[LEFT], LEFT)?;
                return Some(leaf.cast());
            }

            if bit >= 0 {
                bit = string_equal_bits(x, Self::key_bytes(node), bit);
                if bit < onb {
                    if bit >= 0 {
                        return None;
                    }
                    // The needle matched a whole key here. In a unique tree
                    // that key can only be this node's; otherwise keep
                    // descending to the leaf without comparing further.
                    if root.is_unique() {
                        return Some(node);
                    }
                } else if bit > onb {
                    bit = onb;
                }
            }

            troot = node.as_ref().node.branches.b[get_bit(x, onb)];
        }
    }
}

unsafe impl TreeNode for StrNode {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    use crate::iter::Iter;

    fn cstrings(strs: &[&str]) -> Vec<CString> {
        strs.iter().map(|s| CString::new(*s).unwrap()).collect()
    }

    unsafe fn build(root: &mut Root, keys: &[CString]) -> Vec<Box<StrNode>> {
        let mut nodes: Vec<Box<StrNode>> =
            keys.iter().map(|k| Box::new(StrNode::new(k))).collect();
        for n in &mut nodes {
            StrNode::insert(root, NonNull::from(&mut **n));
        }
        nodes
    }

    fn collect(root: &Root) -> Vec<String> {
        unsafe { Iter::<StrNode>::new(root) }
            .map(|n| unsafe { n.key() }.to_str().unwrap().to_owned())
            .collect()
    }

    #[test]
    fn string_order() {
        let mut root = Root::new();
        let keys = cstrings(&["pear", "apple", "peach", "fig", "banana"]);
        let _nodes = unsafe { build(&mut root, &keys) };

        assert_eq!(
            collect(&root),
            vec!["apple", "banana", "fig", "peach", "pear"]
        );
        unsafe {
            let hit = StrNode::lookup(&root, &keys[2]).unwrap();
            assert_eq!(hit.as_ref().key().to_bytes(), b"peach");
            let miss = CString::new("pea").unwrap();
            assert!(StrNode::lookup(&root, &miss).is_none());
        }
    }

    #[test]
    fn prefixes_are_distinct_keys() {
        // A key and its proper prefixes must all coexist and sort right.
        let mut root = Root::new();
        let keys = cstrings(&["tt", "t", "", "ttt", "ta"]);
        let _nodes = unsafe { build(&mut root, &keys) };

        assert_eq!(collect(&root), vec!["", "t", "ta", "tt", "ttt"]);
        unsafe {
            StrNode::check(&root);
            for k in &keys {
                let hit = StrNode::lookup(&root, k).unwrap();
                assert_eq!(hit.as_ref().key().to_bytes(), k.to_bytes());
            }
        }
    }

    #[test]
    fn related_keys_regression() {
        // All keys relate to one of them after the first split; the
        // overshoot bound in the descent is what keeps this correct.
        let mut root = Root::new();
        let keys = cstrings(&["7", "KK", "K", "HZ"]);
        let _nodes = unsafe { build(&mut root, &keys) };

        assert_eq!(collect(&root), vec!["7", "HZ", "K", "KK"]);
        unsafe {
            for k in &keys {
                assert!(StrNode::lookup(&root, k).is_some());
            }
            let miss = CString::new("H").unwrap();
            assert!(StrNode::lookup(&root, &miss).is_none());
        }
    }

    #[test]
    fn string_duplicates() {
        let mut root = Root::new();
        let keys = cstrings(&["dup", "dup", "dup"]);
        let nodes = unsafe { build(&mut root, &keys) };
        unsafe {
            let ptrs: Vec<NonNull<StrNode>> = nodes
                .iter()
                .map(|n| NonNull::from(&**n))
                .collect();

            let first = StrNode::lookup(&root, &keys[0]).unwrap();
            assert_eq!(first, ptrs[0]);
            assert_eq!(StrNode::next(first).unwrap(), ptrs[1]);
            assert_eq!(StrNode::next(ptrs[1]).unwrap(), ptrs[2]);
            assert!(StrNode::next(ptrs[2]).is_none());
        }
    }

    #[test]
    fn unique_strings() {
        let mut root = Root::new_unique();
        let keys = cstrings(&["solo"]);
        let mut a = Box::new(StrNode::new(&keys[0]));
        let mut b = Box::new(StrNode::new(&keys[0]));
        unsafe {
            let pa = NonNull::from(&mut *a);
            let pb = NonNull::from(&mut *b);
            assert_eq!(StrNode::insert(&mut root, pa), pa);
            assert_eq!(StrNode::insert(&mut root, pb), pa);
            assert!(!b.in_tree());

            // The early-out in unique-mode lookup still lands on the key.
            let hit = StrNode::lookup(&root, &keys[0]).unwrap();
            assert_eq!(hit.as_ref().key().to_bytes(), b"solo");
        }
    }

    #[test]
    fn delete_strings() {
        let mut root = Root::new();
        let keys = cstrings(&["a", "ab", "abc", "b"]);
        let nodes = unsafe { build(&mut root, &keys) };
        unsafe {
            let victim = NonNull::from(&*nodes[1]);
            StrNode::delete(victim);
            assert_eq!(collect(&root), vec!["a", "abc", "b"]);
            assert!(StrNode::lookup(&root, &keys[1]).is_none());
            assert!(StrNode::lookup(&root, &keys[2]).is_some());
        }
    }
}
