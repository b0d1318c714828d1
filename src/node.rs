//! The shared tree skeleton: node header, root, traversal and unlinking.
//!
//! Every stored item embeds a [`Node`] at offset zero. A node plays up to
//! two roles at once: it is always a *leaf* (the slot carrying its key),
//! and once a second key arrives in its subtree it also serves as an
//! *inner* node somewhere above. The two roles are wired independently
//! through `leaf_p` and `node_p`, which is what makes deletion O(1): the
//! parent of the departing leaf is always a spare inner role that can be
//! recycled in place.
//!
//! Nothing here allocates. Node storage belongs to the caller and must
//! stay put while linked; operations hand pointers around as `NonNull`.

use std::marker::PhantomPinned;
use std::ptr::{addr_of_mut, NonNull};

use crate::link::{Link, INNER, LEAF, LEFT, RIGHT};

/// The pair of tagged child links carried by every node and every root.
/// Links point at this field, not at the owning node, so an edge's tag
/// plus its referent name the sibling slot directly.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub(crate) struct Branches {
    pub(crate) b: [Link; 2],
}

impl Branches {
    pub(crate) const fn new() -> Branches {
        Branches { b: [Link::NONE; 2] }
    }
}

// The low bit of every link must be free for the tag.
const _: () = assert!(std::mem::align_of::<Branches>() >= 2);
const _: () = assert!(std::mem::align_of::<Node>() >= 2);

/// A tree root: a left link to the tree body (null when empty) and a
/// right slot repurposed as the unique-keys flag. The right slot never
/// points at tree content.
///
/// An all-zero root is a valid empty tree accepting duplicate keys.
/// Parent links of the topmost node point back into the root, so a root
/// must not move while its tree is populated.
#[derive(Debug)]
#[repr(C)]
pub struct Root {
    pub(crate) branches: Branches,
    _pin: PhantomPinned,
}

impl Root {
    /// An empty tree in which equal keys may coexist.
    pub const fn new() -> Root {
        Root {
            branches: Branches::new(),
            _pin: PhantomPinned,
        }
    }

    /// An empty tree which rejects duplicate keys: inserting an already
    /// present key hands back the incumbent node.
    pub const fn new_unique() -> Root {
        Root {
            branches: Branches {
                b: [Link::NONE, Link::UNIQUE_FLAG],
            },
            _pin: PhantomPinned,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.branches.b[LEFT].is_none()
    }

    #[inline]
    pub fn is_unique(&self) -> bool {
        self.branches.b[RIGHT].tag() == 1
    }

    #[inline]
    pub(crate) fn branches_ptr(&self) -> NonNull<Branches> {
        NonNull::from(&self.branches)
    }
}

impl Default for Root {
    fn default() -> Root {
        Root::new()
    }
}

/// The node header embedded (first) in every stored item.
///
/// `bit` disambiguates the inner role: on ordinary inner nodes of integer
/// trees it is the key bit selecting the child; on byte-string trees it
/// counts identical leading bits instead; negative values mark the
/// duplicate subtree, with `-1` sitting immediately above two equal keys.
/// `pfx` is the key's prefix length in bits, used only by the byte-string
/// prefix operations.
#[derive(Debug)]
#[repr(C)]
pub struct Node {
    pub(crate) branches: Branches,
    pub(crate) node_p: Link,
    pub(crate) leaf_p: Link,
    pub(crate) bit: i32,
    pub(crate) pfx: u32,
    _pin: PhantomPinned,
}

impl Node {
    pub(crate) const fn new() -> Node {
        Node {
            branches: Branches::new(),
            node_p: Link::NONE,
            leaf_p: Link::NONE,
            bit: 0,
            pfx: 0,
            _pin: PhantomPinned,
        }
    }

    /// A node is linked in a tree iff its leaf role has a parent.
    #[inline]
    pub fn in_tree(&self) -> bool {
        !self.leaf_p.is_none()
    }

    #[inline]
    pub(crate) fn branches_ptr(this: NonNull<Node>) -> NonNull<Branches> {
        this.cast()
    }
}

/// Descend from `start` always through `side`, stopping at the first
/// leaf. A null start (empty tree) yields `None`; inner nodes always have
/// both children, so the walk cannot fall off mid-way.
pub(crate) unsafe fn walk_down(mut start: Link, side: usize) -> Option<NonNull<Node>> {
    if start.addr_is_null() {
        return None;
    }
    while start.tag() == INNER {
        start = start.branches().as_ref().b[side];
    }
    Some(start.node())
}

impl Node {
    pub(crate) unsafe fn first(root: &Root) -> Option<NonNull<Node>> {
        walk_down(root.branches.b[LEFT], LEFT)
    }

    pub(crate) unsafe fn last(root: &Root) -> Option<NonNull<Node>> {
        walk_down(root.branches.b[LEFT], RIGHT)
    }

    /// Next leaf in key order, duplicates included.
    pub(crate) unsafe fn next(this: NonNull<Node>) -> Option<NonNull<Node>> {
        let mut t = this.as_ref().leaf_p;
        while t.tag() != LEFT {
            // Ascending from a right branch: the root cannot be reached
            // this way, its right slot never holds a child.
            t = t.node().as_ref().node_p;
        }
        let t = t.branches().as_ref().b[RIGHT];
        if t.addr_is_null() {
            // We climbed out of the root's left slot: past the last leaf.
            return None;
        }
        walk_down(t, LEFT)
    }

    /// Previous leaf in key order, duplicates included.
    pub(crate) unsafe fn prev(this: NonNull<Node>) -> Option<NonNull<Node>> {
        let mut t = this.as_ref().leaf_p;
        while t.tag() == LEFT {
            if t.branches().as_ref().b[RIGHT].addr_is_null() {
                // Left slot of the root: nothing before us.
                return None;
            }
            t = t.node().as_ref().node_p;
        }
        walk_down(t.branches().as_ref().b[LEFT], RIGHT)
    }

    /// Next leaf only if it carries the same key, i.e. the crossing stays
    /// inside the current duplicate subtree.
    pub(crate) unsafe fn next_dup(this: NonNull<Node>) -> Option<NonNull<Node>> {
        let mut t = this.as_ref().leaf_p;
        while t.tag() != LEFT {
            t = t.node().as_ref().node_p;
        }
        if t.branches().as_ref().b[RIGHT].addr_is_null() {
            return None;
        }
        if t.node().as_ref().bit >= 0 {
            // Crossing here would leave the duplicate subtree.
            return None;
        }
        walk_down(t.branches().as_ref().b[RIGHT], LEFT)
    }

    /// Previous leaf only if it carries the same key.
    pub(crate) unsafe fn prev_dup(this: NonNull<Node>) -> Option<NonNull<Node>> {
        let mut t = this.as_ref().leaf_p;
        while t.tag() == LEFT {
            if t.branches().as_ref().b[RIGHT].addr_is_null() {
                return None;
            }
            t = t.node().as_ref().node_p;
        }
        if t.node().as_ref().bit >= 0 {
            return None;
        }
        walk_down(t.branches().as_ref().b[LEFT], RIGHT)
    }

    /// First leaf of the next distinct key: an entire duplicate subtree is
    /// skipped as one unit by refusing to cross below a negative bit.
    pub(crate) unsafe fn next_unique(this: NonNull<Node>) -> Option<NonNull<Node>> {
        let mut t = this.as_ref().leaf_p;
        let t = loop {
            if t.tag() != LEFT {
                t = t.node().as_ref().node_p;
            } else {
                if t.branches().as_ref().b[RIGHT].addr_is_null() {
                    return None;
                }
                if t.node().as_ref().bit >= 0 {
                    break t;
                }
                // Still inside a duplicate subtree, keep climbing.
                t = t.node().as_ref().node_p;
            }
        };
        walk_down(t.branches().as_ref().b[RIGHT], LEFT)
    }

    /// Last leaf of the previous distinct key.
    pub(crate) unsafe fn prev_unique(this: NonNull<Node>) -> Option<NonNull<Node>> {
        let mut t = this.as_ref().leaf_p;
        let t = loop {
            if t.tag() == LEFT {
                if t.branches().as_ref().b[RIGHT].addr_is_null() {
                    return None;
                }
                t = t.node().as_ref().node_p;
            } else {
                if t.node().as_ref().bit >= 0 {
                    break t;
                }
                t = t.node().as_ref().node_p;
            }
        };
        walk_down(t.branches().as_ref().b[LEFT], RIGHT)
    }

    /// Unlink the node from its tree in constant time. A no-op on nodes
    /// which are not in a tree, so deleting twice is fine.
    pub(crate) unsafe fn delete(this: NonNull<Node>) {
        let node = this.as_ptr();

        if (*node).leaf_p.is_none() {
            return;
        }

        let pside = (*node).leaf_p.tag();
        let pbranches = (*node).leaf_p.branches();

        if (*pbranches.as_ptr()).b[RIGHT].addr_is_null() {
            // Hanging straight below the root (only its left slot can hold
            // a leaf): the tree becomes empty.
            (*pbranches.as_ptr()).b[LEFT] = Link::NONE;
            (*node).leaf_p = Link::NONE;
            return;
        }

        // The parent is a real node. Reparent our sibling onto the
        // grandparent, in the parent's place; the grandparent may be the
        // root itself, which is why only its branches are touched.
        let parent = pbranches.cast::<Node>().as_ptr();
        let gpside = (*parent).node_p.tag();
        let gparent = (*parent).node_p.branches();

        let sibling = (*parent).branches.b[1 - pside];
        (*gparent.as_ptr()).b[gpside] = sibling;
        if sibling.tag() == LEAF {
            (*sibling.node().as_ptr()).leaf_p = Link::new(gparent, gpside);
        } else {
            (*sibling.node().as_ptr()).node_p = Link::new(gparent, gpside);
        }

        // The parent's inner role is now spare. When the parent is our own
        // node this also just cleared our node_p, and the test below ends
        // the job.
        (*parent).node_p = Link::NONE;

        if (*node).node_p.is_none() {
            (*node).leaf_p = Link::NONE;
            return;
        }

        // Our inner role is still wired somewhere above; recycle the spare
        // parent in its place. The parent sits below that position, so its
        // key is a valid witness for the bit string there.
        (*parent).node_p = (*node).node_p;
        (*parent).branches = (*node).branches;
        (*parent).bit = (*node).bit;

        let parent_branches = NonNull::new_unchecked(addr_of_mut!((*parent).branches));
        let gpside = (*parent).node_p.tag();
        let gparent = (*parent).node_p.branches();
        (*gparent.as_ptr()).b[gpside] = Link::new(parent_branches, INNER);

        for side in [LEFT, RIGHT] {
            let child = (*parent).branches.b[side];
            if child.tag() == INNER {
                (*child.node().as_ptr()).node_p = Link::new(parent_branches, side);
            } else {
                (*child.node().as_ptr()).leaf_p = Link::new(parent_branches, side);
            }
        }

        (*node).leaf_p = Link::NONE;
    }

    /// Add `new` to the duplicate subtree rooted at `sub`; both carry the
    /// same key. The chain is kept right-leaning, `-1` sitting just above
    /// the leaves and each level above one lower, so in-order traversal
    /// yields insertion order.
    pub(crate) unsafe fn insert_dup(sub: NonNull<Node>, new: NonNull<Node>) -> NonNull<Node> {
        let mut sub = sub;
        let mut head = sub;

        let new_branches = Node::branches_ptr(new);
        let new_left = Link::new(new_branches, LEFT);
        let new_right = Link::new(new_branches, RIGHT);
        let new_leaf = Link::new(new_branches, LEAF);

        // Walk the right spine, remembering the last hole in the negative
        // bit sequence (a spot freed by an earlier deletion).
        while head.as_ref().branches.b[RIGHT].tag() != LEAF {
            let last_bit = head.as_ref().bit;
            head = head.as_ref().branches.b[RIGHT].node();
            if head.as_ref().bit > last_bit + 1 {
                sub = head;
            }
        }

        let new = new.as_ptr();
        if head.as_ref().bit < -1 {
            // There is room just above the rightmost leaf; splice in there.
            (*new).bit = -1;
            let leaf = head.as_ref().branches.b[RIGHT].node();
            (*head.as_ptr()).branches.b[RIGHT] = Link::new(new_branches, INNER);

            (*new).node_p = leaf.as_ref().leaf_p;
            (*new).leaf_p = new_right;
            (*leaf.as_ptr()).leaf_p = new_left;
            (*new).branches.b[LEFT] = Link::new(Node::branches_ptr(leaf), LEAF);
            (*new).branches.b[RIGHT] = new_leaf;
        } else {
            // No hole before the leaf: insert above <sub>, the spine top or
            // the deepest hole found. <sub> may hang off the tree root.
            (*new).bit = sub.as_ref().bit - 1;
            let side = sub.as_ref().node_p.tag();
            let up = sub.as_ref().node_p.branches();
            (*up.as_ptr()).b[side] = Link::new(new_branches, INNER);

            (*new).node_p = sub.as_ref().node_p;
            (*new).leaf_p = new_right;
            (*sub.as_ptr()).node_p = new_left;
            (*new).branches.b[LEFT] = Link::new(Node::branches_ptr(sub), INNER);
            (*new).branches.b[RIGHT] = new_leaf;
        }
        NonNull::new_unchecked(new)
    }
}

/// Cast seam for the typed node flavors.
///
/// Every flavor is `#[repr(C)]` with a [`Node`] as its first field, so the
/// shared traversal and unlinking operations apply to all of them through
/// a pointer cast.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` with a [`Node`] header at offset
/// zero. Every pointer passed to these operations must reference a live
/// node of the same tree (and hence the same flavor), and the usual
/// aliasing rules apply: no other mutation may overlap a call.
pub unsafe trait TreeNode: Sized {
    /// Leftmost (smallest-keyed, first-inserted) leaf of the tree.
    ///
    /// # Safety
    /// All nodes linked under `root` must be live `Self` values.
    #[inline]
    unsafe fn first(root: &Root) -> Option<NonNull<Self>> {
        Node::first(root).map(NonNull::cast)
    }

    /// Rightmost leaf of the tree.
    ///
    /// # Safety
    /// As [`TreeNode::first`].
    #[inline]
    unsafe fn last(root: &Root) -> Option<NonNull<Self>> {
        Node::last(root).map(NonNull::cast)
    }

    /// Next leaf in key order; equal keys come out in insertion order.
    ///
    /// # Safety
    /// `this` must be linked in a tree of live `Self` nodes.
    #[inline]
    unsafe fn next(this: NonNull<Self>) -> Option<NonNull<Self>> {
        Node::next(this.cast()).map(NonNull::cast)
    }

    /// Previous leaf in key order.
    ///
    /// # Safety
    /// As [`TreeNode::next`].
    #[inline]
    unsafe fn prev(this: NonNull<Self>) -> Option<NonNull<Self>> {
        Node::prev(this.cast()).map(NonNull::cast)
    }

    /// Next leaf carrying the same key, if any.
    ///
    /// # Safety
    /// As [`TreeNode::next`].
    #[inline]
    unsafe fn next_dup(this: NonNull<Self>) -> Option<NonNull<Self>> {
        Node::next_dup(this.cast()).map(NonNull::cast)
    }

    /// Previous leaf carrying the same key, if any.
    ///
    /// # Safety
    /// As [`TreeNode::next`].
    #[inline]
    unsafe fn prev_dup(this: NonNull<Self>) -> Option<NonNull<Self>> {
        Node::prev_dup(this.cast()).map(NonNull::cast)
    }

    /// First leaf of the next distinct key, skipping duplicates.
    ///
    /// # Safety
    /// As [`TreeNode::next`].
    #[inline]
    unsafe fn next_unique(this: NonNull<Self>) -> Option<NonNull<Self>> {
        Node::next_unique(this.cast()).map(NonNull::cast)
    }

    /// Last leaf of the previous distinct key, skipping duplicates.
    ///
    /// # Safety
    /// As [`TreeNode::next`].
    #[inline]
    unsafe fn prev_unique(this: NonNull<Self>) -> Option<NonNull<Self>> {
        Node::prev_unique(this.cast()).map(NonNull::cast)
    }

    /// Unlink `this` from its tree in O(1). No-op when already unlinked;
    /// only the deleted node is invalidated, every other node (and any
    /// pointer to it) stays valid.
    ///
    /// # Safety
    /// `this` must reference a live node; if linked, its tree must consist
    /// of live `Self` nodes.
    #[inline]
    unsafe fn delete(this: NonNull<Self>) {
        Node::delete(this.cast())
    }
}
