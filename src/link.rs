//! Tagged link words.
//!
//! Every edge in the tree is a single machine word: the address of the
//! target's [`Branches`] field with one bit of metadata packed into bit
//! zero. Branch links tag what they point at ([`LEAF`] or [`INNER`]);
//! parent links tag which side ([`LEFT`] or [`RIGHT`]) the child hangs on,
//! so walking up an edge immediately tells us which slot to come back
//! down through.
//!
//! Links address the `branches` field rather than the node itself. The
//! field lives at offset zero of every node, so the two addresses
//! coincide for real nodes, and a tree root (which is a bare [`Branches`]
//! with a flag word) can be linked to exactly like a node without ever
//! being one.

use std::ptr::NonNull;

use crate::node::{Branches, Node};

/// Left child slot, and the tag of a parent link whose child hangs left.
pub(crate) const LEFT: usize = 0;
/// Right child slot / right-side parent tag.
pub(crate) const RIGHT: usize = 1;

/// Branch link tag: the referent is a leaf.
pub(crate) const LEAF: usize = 0;
/// Branch link tag: the referent is an inner node.
pub(crate) const INNER: usize = 1;

/// One tagged edge. Zero is the null link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct Link(usize);

impl Link {
    pub(crate) const NONE: Link = Link(0);

    /// A link with a null address but the tag set. Only the right slot of
    /// a unique-mode root ever looks like this.
    pub(crate) const UNIQUE_FLAG: Link = Link(1);

    #[inline]
    pub(crate) fn new(target: NonNull<Branches>, tag: usize) -> Link {
        debug_assert!(tag <= 1);
        Link(target.as_ptr() as usize | tag)
    }

    #[inline]
    pub(crate) fn is_none(self) -> bool {
        self.0 == 0
    }

    /// True when the address part is null, whatever the tag. Matches both
    /// slots of an empty root, and the right slot of any root.
    #[inline]
    pub(crate) fn addr_is_null(self) -> bool {
        self.0 & !1 == 0
    }

    #[inline]
    pub(crate) fn tag(self) -> usize {
        self.0 & 1
    }

    /// Address of the referenced `branches` field.
    #[inline]
    pub(crate) fn branches(self) -> NonNull<Branches> {
        debug_assert!(!self.addr_is_null());
        unsafe { NonNull::new_unchecked((self.0 & !1) as *mut Branches) }
    }

    /// The referenced node. Valid because `branches` sits at offset zero
    /// of every node type. Must not be used on a link to a tree root,
    /// which has no node around its `Branches`.
    #[inline]
    pub(crate) fn node(self) -> NonNull<Node> {
        self.branches().cast()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Branches;

    #[test]
    fn tag_roundtrip() {
        let target = Branches::new();
        let ptr = NonNull::from(&target);

        for tag in [LEAF, INNER] {
            let link = Link::new(ptr, tag);
            assert!(!link.is_none());
            assert!(!link.addr_is_null());
            assert_eq!(link.tag(), tag);
            assert_eq!(link.branches(), ptr);
        }
    }

    #[test]
    fn null_links() {
        assert!(Link::NONE.is_none());
        assert!(Link::NONE.addr_is_null());
        assert_eq!(Link::NONE.tag(), 0);

        assert!(!Link::UNIQUE_FLAG.is_none());
        assert!(Link::UNIQUE_FLAG.addr_is_null());
        assert_eq!(Link::UNIQUE_FLAG.tag(), 1);
    }
}
