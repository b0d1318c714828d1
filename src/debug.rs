//! Consistency checking and structure dumps, for tests and debugging.

use smallvec::SmallVec;

use crate::bytes::BytesNode;
use crate::int::{IntKey, IntNode};
use crate::istr::StrNode;
use crate::iter::Iter;
use crate::link::{Link, INNER, LEAF, LEFT, RIGHT};
use crate::node::{Node, Root};
use crate::ptr::PtrNode;

/// How inner bit values are ordered along a root-to-leaf path in the
/// ordinary region: integer trees store bit *positions* (shrinking on the
/// way down), byte-string trees store equal-prefix *counts* (growing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BitOrder {
    Position,
    PrefixCount,
}

/// Walk the whole tree asserting the structural invariants: parent links
/// point back where the children hang, inner roles belong to linked
/// nodes, bit values are properly ordered, and duplicate subtrees are
/// made of negative bits only. Panics on the first violation.
pub(crate) unsafe fn check_structure(root: &Root, order: BitOrder) {
    let root_right = root.branches.b[RIGHT];
    assert!(
        root_right.addr_is_null(),
        "the root's right slot must only carry the mode flag"
    );

    let top = root.branches.b[LEFT];
    if top.is_none() {
        return;
    }

    // (link, expected parent link, parent bit, parent in dup region)
    type Frame = (Link, Link, Option<i32>, bool);
    let mut stack: SmallVec<[Frame; 32]> = SmallVec::new();
    stack.push((top, Link::new(root.branches_ptr(), LEFT), None, false));

    while let Some((link, expected_parent, parent_bit, in_dup)) = stack.pop() {
        assert!(!link.addr_is_null(), "no child link may be null");
        let node = link.node();

        if link.tag() == LEAF {
            assert_eq!(
                node.as_ref().leaf_p,
                expected_parent,
                "leaf parent link does not match its slot"
            );
            continue;
        }

        assert_eq!(
            node.as_ref().node_p,
            expected_parent,
            "inner parent link does not match its slot"
        );
        assert_ne!(
            expected_parent.branches(),
            Node::branches_ptr(node),
            "a node cannot be its own parent"
        );
        assert!(
            !node.as_ref().leaf_p.is_none(),
            "an inner role must belong to a node that is in the tree"
        );

        let bit = node.as_ref().bit;
        if in_dup {
            assert!(bit < 0, "ordinary node below a duplicate subtree");
        }
        if bit < 0 {
            if in_dup {
                // Bits count up towards -1 just above the leaves.
                assert!(
                    parent_bit.unwrap() < bit,
                    "duplicate chain bits must grow towards the leaves"
                );
            }
        } else if let Some(pbit) = parent_bit {
            if !in_dup && pbit >= 0 {
                match order {
                    BitOrder::Position => assert!(
                        bit < pbit,
                        "bit positions must shrink towards the leaves"
                    ),
                    BitOrder::PrefixCount => assert!(
                        bit > pbit,
                        "prefix counts must grow towards the leaves"
                    ),
                }
            }
        }

        let branches = Node::branches_ptr(node);
        for side in [LEFT, RIGHT] {
            stack.push((
                node.as_ref().branches.b[side],
                Link::new(branches, side),
                Some(bit),
                bit < 0,
            ));
        }
    }
}

/// Dump the tree shape to stderr, one node per line.
#[allow(unused)]
pub unsafe fn print_tree(root: &Root) {
    unsafe fn print_link(link: Link, depth: usize) {
        for _ in 0..depth {
            eprint!("  ");
        }
        let node = link.node();
        if link.tag() == LEAF {
            eprintln!("leaf {:?}", node.as_ptr());
        } else {
            eprintln!("inner {:?} (bit {})", node.as_ptr(), node.as_ref().bit);
            print_link(node.as_ref().branches.b[LEFT], depth + 1);
            print_link(node.as_ref().branches.b[RIGHT], depth + 1);
        }
    }

    eprintln!(
        "tree {:?}{}",
        root as *const _,
        if root.is_unique() { " (unique)" } else { "" }
    );
    if let Some(top) = (!root.is_empty()).then(|| root.branches.b[LEFT]) {
        print_link(top, 1);
    } else {
        eprintln!("  (empty)");
    }
}

impl<K: IntKey> IntNode<K> {
    /// Assert the tree is well formed and its keys enumerate in order.
    /// For tests; panics on corruption.
    ///
    /// # Safety
    /// As [`IntNode::lookup`].
    pub unsafe fn check(root: &Root) {
        check_structure(root, BitOrder::Position);
        let mut iter = Iter::<IntNode<K>>::new(root).map(|n| n.key().ordinal()).peekable();
        while let Some(k) = iter.next() {
            if let Some(&next) = iter.peek() {
                assert!(k <= next, "keys must enumerate in non-decreasing order");
            }
        }
    }
}

impl<const N: usize> BytesNode<N> {
    /// Assert the tree is well formed; for plain (non-prefix) trees the
    /// keys must also enumerate lexicographically.
    ///
    /// # Safety
    /// As [`BytesNode::lookup`].
    pub unsafe fn check(root: &Root, plain: bool) {
        check_structure(root, BitOrder::PrefixCount);
        if !plain {
            return;
        }
        let mut iter = Iter::<BytesNode<N>>::new(root).map(|n| *n.key()).peekable();
        while let Some(k) = iter.next() {
            if let Some(next) = iter.peek() {
                assert!(&k <= next, "keys must enumerate in lexicographic order");
            }
        }
    }
}

impl StrNode {
    /// Assert the tree is well formed and its strings enumerate in order.
    ///
    /// # Safety
    /// As [`StrNode::lookup`].
    pub unsafe fn check(root: &Root) {
        check_structure(root, BitOrder::PrefixCount);
        let mut prev: Option<&[u8]> = None;
        for n in Iter::<StrNode>::new(root) {
            let bytes = n.key().to_bytes();
            if let Some(prev) = prev {
                assert!(prev <= bytes, "strings must enumerate in lexicographic order");
            }
            prev = Some(bytes);
        }
    }
}

impl PtrNode {
    /// Assert the tree is well formed and the addresses enumerate in
    /// order.
    ///
    /// # Safety
    /// As [`PtrNode::lookup`].
    pub unsafe fn check(root: &Root) {
        check_structure(root, BitOrder::Position);
        let mut prev: Option<usize> = None;
        for n in Iter::<PtrNode>::new(root) {
            let key = n.key() as usize;
            if let Some(prev) = prev {
                assert!(prev <= key, "addresses must enumerate in order");
            }
            prev = Some(key);
        }
    }
}
