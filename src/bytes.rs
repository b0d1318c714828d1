//! Byte-string keyed trees.
//!
//! Two differences from the integer flavors. First, an ordinary inner
//! node stores the *count of identical leading bits* shared by its
//! subtree rather than a bit position, and descent compares prefixes
//! byte-wise instead of shifting. Second, a prefix variant supports
//! keys qualified by a prefix length (think CIDR routes): inner bit
//! counts are doubled there, and nodes with the low bit clear are *cover
//! nodes* whose left subtree holds the shorter (covering) prefix and
//! whose right subtree holds everything it covers. Longest-prefix-match
//! descends remembering the last cover as its fallback.
//!
//! A given tree must be fed through either the plain operations or the
//! prefix operations, never both, and with one key length throughout.

use std::ptr::{addr_of_mut, NonNull};

use crate::bits::{check_bits, cmp_bits, equal_bits, get_bit};
use crate::link::{Link, INNER, LEAF, LEFT, RIGHT};
use crate::node::{walk_down, Branches, Node, Root, TreeNode};

/// A tree node carrying an inline `N`-byte key, ordered lexicographically.
#[derive(Debug)]
#[repr(C)]
pub struct BytesNode<const N: usize> {
    node: Node,
    key: [u8; N],
}

impl<const N: usize> BytesNode<N> {
    /// A node claiming its full width as prefix.
    pub const fn new(key: [u8; N]) -> BytesNode<N> {
        Self::new_prefix(key, (N * 8) as u32)
    }

    /// A node whose key is qualified by a prefix length in bits, for use
    /// with the prefix operations. Bits past the prefix should be zero.
    pub const fn new_prefix(key: [u8; N], pfx: u32) -> BytesNode<N> {
        assert!(pfx as usize <= N * 8);
        let mut node = Node::new();
        node.pfx = pfx;
        BytesNode { node, key }
    }

    #[inline]
    pub fn key(&self) -> &[u8; N] {
        &self.key
    }

    /// Prefix length in bits.
    #[inline]
    pub fn prefix_len(&self) -> u32 {
        self.node.pfx
    }

    #[inline]
    pub fn in_tree(&self) -> bool {
        self.node.in_tree()
    }

    unsafe fn link_first_leaf(root: &mut Root, new: NonNull<BytesNode<N>>) {
        let root_branches = NonNull::from(&root.branches);
        let newp = new.as_ptr();
        (*root_branches.as_ptr()).b[LEFT] = Link::new(new.cast(), LEAF);
        (*newp).node.leaf_p = Link::new(root_branches, LEFT);
        (*newp).node.node_p = Link::NONE;
    }

    /// Insert `new` using the first `len` bytes of its key. Every insert
    /// into one tree must use the same `len`. Returns `new`, or the
    /// incumbent for a duplicate key in a unique-mode tree.
    ///
    /// # Safety
    /// As [`IntNode::insert`](crate::IntNode::insert), with `BytesNode<N>`
    /// nodes throughout.
    pub unsafe fn insert(
        root: &mut Root,
        new: NonNull<BytesNode<N>>,
        len: usize,
    ) -> NonNull<BytesNode<N>> {
        assert!(len <= N);
        let newp = new.as_ptr();

        let mut side = LEFT;
        let mut troot = root.branches.b[LEFT];
        let root_right = root.branches.b[RIGHT];
        if troot.is_none() {
            Self::link_first_leaf(root, new);
            return new;
        }

        let len = (len * 8) as i32;
        let newkey: &[u8; N] = &(*newp).key;
        let mut parent = NonNull::from(&root.branches);
        let mut bit: i32 = 0;
        let old: NonNull<BytesNode<N>>;
        let up_ptr: *mut Link;

        loop {
            if troot.tag() == LEAF {
                old = troot.node().cast();
                (*newp).node.node_p = old.as_ref().node.leaf_p;
                up_ptr = addr_of_mut!((*old.as_ptr()).node.leaf_p);
                bit = equal_bits(newkey, &old.as_ref().key, bit, len);
                break;
            }

            let cur: NonNull<BytesNode<N>> = troot.node().cast();
            let onb = cur.as_ref().node.bit;

            if onb < 0 {
                // Above a duplicate subtree: the whole value decides.
                old = cur;
                (*newp).node.node_p = old.as_ref().node.node_p;
                up_ptr = addr_of_mut!((*old.as_ptr()).node.node_p);
                bit = equal_bits(newkey, &old.as_ref().key, bit, len);
                break;
            }

            bit = equal_bits(newkey, &cur.as_ref().key, bit, onb);
            if bit < onb {
                // The keys part company above this node's split point.
                old = cur;
                (*newp).node.node_p = old.as_ref().node.node_p;
                up_ptr = addr_of_mut!((*old.as_ptr()).node.node_p);
                break;
            }

            // The compare may have looked past the split point against a
            // key from a different branch; only the split point is trusted.
            bit = onb;
            parent = Node::branches_ptr(troot.node());
            side = get_bit(newkey, onb);
            troot = cur.as_ref().node.branches.b[side];
        }

        let new_branches: NonNull<Branches> = new.cast();
        let new_left = Link::new(new_branches, LEFT);
        let new_right = Link::new(new_branches, RIGHT);
        let new_leaf = Link::new(new_branches, LEAF);

        (*newp).node.bit = bit;

        let diff = if bit < len {
            cmp_bits(newkey, &old.as_ref().key, bit)
        } else {
            0
        };

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

    /// Find the first inserted node whose key matches `x` on its full
    /// length. `x.len()` must equal the length the tree was built with.
    ///
    /// # Safety
    /// Every node linked under `root` must be a live `BytesNode<N>`.
    pub unsafe fn lookup(root: &Root, x: &[u8]) -> Option<NonNull<BytesNode<N>>> {
        assert!(x.len() <= N);
        let mut troot = root.branches.b[LEFT];
        if troot.is_none() {
            return None;
        }

        let mut pos: i32 = 0; // bits known equal so far
        loop {
            if troot.tag() == LEAF {
                let node: NonNull<BytesNode<N>> = troot.node().cast();
                let pb = (pos >> 3) as usize;
                return (node.as_ref().key[pb..x.len()] == x[pb..]).then_some(node);
            }

            let node: NonNull<BytesNode<N>> = troot.node().cast();
            let bit = node.as_ref().node.bit;

            if bit < 0 {
                // A duplicate subtree: either it carries our value and the
                // first insertion is its leftmost leaf, or we're done.
                let pb = (pos >> 3) as usize;
                if node.as_ref().key[pb..x.len()] != x[pb..] {
                    return None;
                }
                let leaf = walk_down(node.as_ref().node.branches.b[LEFT], LEFT)?;
                return Some(leaf.cast());
            }

            debug_assert!(bit < (x.len() * 8) as i32);
            if equal_bits(x, &node.as_ref().key[..], pos, bit) < bit {
                return None;
            }
            pos = bit;
            troot = node.as_ref().node.branches.b[get_bit(x, bit)];
        }
    }

    /// Insert `new` as a prefix of `len` bytes, honoring its prefix
    /// length. Cover nodes keep shorter prefixes above the subtrees they
    /// cover so that [`lookup_longest`](Self::lookup_longest) works.
    ///
    /// # Safety
    /// As [`BytesNode::insert`].
    pub unsafe fn insert_prefix(
        root: &mut Root,
        new: NonNull<BytesNode<N>>,
        len: usize,
    ) -> NonNull<BytesNode<N>> {
        assert!(len <= N);
        let newp = new.as_ptr();

        let mut side = LEFT;
        let mut troot = root.branches.b[LEFT];
        let root_right = root.branches.b[RIGHT];
        if troot.is_none() {
            Self::link_first_leaf(root, new);
            return new;
        }

        let npfx = (*newp).node.pfx as i32;
        let len = ((len * 8) as i32).min(npfx);
        let newkey: &[u8; N] = &(*newp).key;
        let mut parent = NonNull::from(&root.branches);
        let mut bit: i32 = 0;
        let old: NonNull<BytesNode<N>>;
        let up_ptr: *mut Link;
        // Mid-descent exits decide the side on the spot; meeting a leaf or
        // a duplicate subtree leaves the decision to the epilogue.
        let mut decided: Option<i32> = None;

        loop {
            if troot.tag() == LEAF {
                // This leaf may be the left half of a cover node; the
                // epilogue sorts that out from the prefix lengths.
                old = troot.node().cast();
                (*newp).node.node_p = old.as_ref().node.leaf_p;
                up_ptr = addr_of_mut!((*old.as_ptr()).node.leaf_p);
                let l = len.min(old.as_ref().node.pfx as i32);
                bit = equal_bits(newkey, &old.as_ref().key, bit, l);
                break;
            }

            let cur: NonNull<BytesNode<N>> = troot.node().cast();
            let onb = cur.as_ref().node.bit;
            // onb is one of: < 0 duplicate subtree, 2k a cover node for k
            // bits, 2k+1 an ordinary node splitting at bit k.

            if onb < 0 {
                old = cur;
                (*newp).node.node_p = old.as_ref().node.node_p;
                up_ptr = addr_of_mut!((*old.as_ptr()).node.node_p);
                let l = len.min(old.as_ref().node.pfx as i32);
                bit = equal_bits(newkey, &old.as_ref().key, bit, l);
                break;
            }

            let eq = equal_bits(newkey, &cur.as_ref().key, bit, onb >> 1);
            let hbit = (eq << 1) + 1;

            if hbit >= npfx << 1 && npfx << 1 < onb {
                // Our whole (shorter) prefix matches this subtree: cover it
                // from above, with the subtree on the right.
                old = cur;
                (*newp).node.node_p = old.as_ref().node.node_p;
                up_ptr = addr_of_mut!((*old.as_ptr()).node.node_p);
                (*newp).node.bit = npfx << 1;
                decided = Some(-1);
                break;
            }

            if hbit < onb {
                // Keys diverge above this node's split point.
                old = cur;
                (*newp).node.node_p = old.as_ref().node.node_p;
                up_ptr = addr_of_mut!((*old.as_ptr()).node.node_p);
                (*newp).node.bit = hbit;
                decided = Some(cmp_bits(newkey, &old.as_ref().key, hbit >> 1));
                break;
            }

            if onb & 1 == 0 {
                if npfx << 1 == onb {
                    // A cover node with exactly our prefix: the duplicates
                    // live down its left branch; the leaf handling will
                    // finish the job.
                    parent = Node::branches_ptr(troot.node());
                    side = LEFT;
                    troot = cur.as_ref().node.branches.b[LEFT];
                    continue;
                }
                // Cover nodes are walked through on the right.
                parent = Node::branches_ptr(troot.node());
                side = RIGHT;
                bit = onb >> 1;
                troot = cur.as_ref().node.branches.b[RIGHT];
                continue;
            }

            // Ordinary node: trust only its split point for further
            // compares, and descend by our own bit there.
            bit = onb >> 1;
            parent = Node::branches_ptr(troot.node());
            side = get_bit(newkey, onb >> 1);
            troot = cur.as_ref().node.branches.b[side];
        }

        let new_branches: NonNull<Branches> = new.cast();
        let new_left = Link::new(new_branches, LEFT);
        let new_right = Link::new(new_branches, RIGHT);
        let new_leaf = Link::new(new_branches, LEAF);

        let diff = match decided {
            Some(diff) => diff,
            None => {
                // We stopped on a leaf or a duplicate subtree. Compare at
                // the largest bit meaningful to both prefixes.
                let opfx = old.as_ref().node.pfx as i32;
                bit = bit.min(npfx).min(opfx);
                (*newp).node.bit = (bit << 1) + 1;

                let mut diff = 0;
                if bit < opfx && bit < npfx {
                    diff = cmp_bits(newkey, &old.as_ref().key, bit);
                }

                if diff == 0 {
                    // Same bits: either a true duplicate, or one prefix
                    // includes the other and a cover node goes in.
                    (*newp).node.bit -= 1;
                    if npfx == opfx {
                        (*newp).node.bit = -1;
                        if root_right.tag() == 1 {
                            (*newp).node.node_p = Link::NONE;
                            return old;
                        }
                        if troot.tag() != LEAF {
                            return Node::insert_dup(old.cast(), new.cast()).cast();
                        }
                    } else if npfx < opfx {
                        // The shorter prefix covers: it takes the left side.
                        diff = -1;
                    }
                }
                diff
            }
        };

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

    /// Find the first inserted node with the longest prefix matching `x`,
    /// in a tree built with [`insert_prefix`](Self::insert_prefix).
    /// `x` must be at least as long as the tree's keys.
    ///
    /// # Safety
    /// As [`BytesNode::lookup`].
    pub unsafe fn lookup_longest(root: &Root, x: &[u8]) -> Option<NonNull<BytesNode<N>>> {
        assert!(x.len() >= N);
        let mut troot = root.branches.b[LEFT];
        if troot.is_none() {
            return None;
        }

        let mut cover = Link::NONE;
        let mut pos: i32 = 0;
        loop {
            if troot.tag() == LEAF {
                let node: NonNull<BytesNode<N>> = troot.node().cast();
                if check_bits(x, &node.as_ref().key, pos >> 3, node.as_ref().node.pfx as i32) {
                    return Some(node);
                }
                break;
            }

            let node: NonNull<BytesNode<N>> = troot.node().cast();
            let nb = node.as_ref().node.bit;

            if nb < 0 {
                // A duplicate subtree: an exact prefix match or nothing
                // deeper than the last cover.
                if check_bits(x, &node.as_ref().key, pos >> 3, node.as_ref().node.pfx as i32) {
                    let leaf = walk_down(node.as_ref().node.branches.b[LEFT], LEFT)?;
                    return Some(leaf.cast());
                }
                break;
            }

            let split = nb >> 1;
            if equal_bits(x, &node.as_ref().key[..], pos, split) < split {
                break;
            }
            let side = if nb & 1 == 0 {
                // A cover node: remember the covering (left) subtree as the
                // best match so far, and keep going among the covered.
                cover = node.as_ref().node.branches.b[LEFT];
                RIGHT
            } else {
                get_bit(x, split)
            };
            pos = split;
            troot = node.as_ref().node.branches.b[side];
        }

        // Nothing further down matched: fall back to the deepest covering
        // prefix crossed on the way, if any.
        walk_down(cover, LEFT).map(NonNull::cast)
    }

    /// Find the first inserted node whose key is exactly the prefix
    /// (`x`, `pfx` bits), in a tree built with
    /// [`insert_prefix`](Self::insert_prefix).
    ///
    /// # Safety
    /// As [`BytesNode::lookup`].
    pub unsafe fn lookup_prefix(
        root: &Root,
        x: &[u8],
        pfx: u32,
    ) -> Option<NonNull<BytesNode<N>>> {
        assert!(x.len() >= N);
        let pfx = pfx as i32;
        let mut troot = root.branches.b[LEFT];
        if troot.is_none() {
            return None;
        }

        let mut pos: i32 = 0;
        loop {
            if troot.tag() == LEAF {
                let node: NonNull<BytesNode<N>> = troot.node().cast();
                return (node.as_ref().node.pfx as i32 == pfx
                    && check_bits(x, &node.as_ref().key, pos >> 3, pfx))
                .then_some(node);
            }

            let node: NonNull<BytesNode<N>> = troot.node().cast();
            let nb = node.as_ref().node.bit;

            if nb < 0 {
                if node.as_ref().node.pfx as i32 != pfx {
                    return None;
                }
                if !check_bits(x, &node.as_ref().key, pos >> 3, pfx) {
                    return None;
                }
                let leaf = walk_down(node.as_ref().node.branches.b[LEFT], LEFT)?;
                return Some(leaf.cast());
            }

            let split = nb >> 1;
            if nb & 1 == 1 {
                // Ordinary node: it splits at `split`, so an entry with a
                // prefix that short would have covered it from above.
                if split >= pfx {
                    return None;
                }
                if equal_bits(x, &node.as_ref().key[..], pos, split) < split {
                    return None;
                }
                pos = split;
                troot = node.as_ref().node.branches.b[get_bit(x, split)];
            } else {
                // Cover node for `split` bits.
                if split > pfx {
                    return None;
                }
                if equal_bits(x, &node.as_ref().key[..], pos, split) < split {
                    return None;
                }
                if split == pfx {
                    // Exactly our prefix: its entries hang left.
                    let leaf = walk_down(node.as_ref().node.branches.b[LEFT], LEFT)?;
                    return Some(leaf.cast());
                }
                pos = split;
                troot = node.as_ref().node.branches.b[RIGHT];
            }
        }
    }
}

unsafe impl<const N: usize> TreeNode for BytesNode<N> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::Iter;

    unsafe fn insert_all<const N: usize>(
        root: &mut Root,
        nodes: &mut [Box<BytesNode<N>>],
        len: usize,
    ) {
        for n in nodes {
            BytesNode::insert(root, NonNull::from(&mut **n), len);
        }
    }

    fn keys<const N: usize>(root: &Root) -> Vec<[u8; N]> {
        unsafe {
            Iter::<BytesNode<N>>::new(root)
                .map(|n| *n.key())
                .collect()
        }
    }

    #[test]
    fn lexicographic_order() {
        let mut root = Root::new();
        let raw: [[u8; 4]; 4] = [*b"abaa", *b"aaab", *b"aaba", *b"aaaa"];
        let mut nodes: Vec<Box<BytesNode<4>>> =
            raw.iter().map(|&k| Box::new(BytesNode::new(k))).collect();
        unsafe {
            insert_all(&mut root, &mut nodes, 4);
            assert_eq!(keys::<4>(&root), vec![*b"aaaa", *b"aaab", *b"aaba", *b"abaa"]);

            assert_eq!(
                BytesNode::<4>::lookup(&root, b"aaba").unwrap().as_ref().key(),
                b"aaba"
            );
            assert!(BytesNode::<4>::lookup(&root, b"aabb").is_none());
            assert!(BytesNode::<4>::lookup(&root, b"zzzz").is_none());

            assert_eq!(BytesNode::<4>::first(&root).unwrap().as_ref().key(), b"aaaa");
            assert_eq!(BytesNode::<4>::last(&root).unwrap().as_ref().key(), b"abaa");
        }
    }

    #[test]
    fn byte_duplicates_fifo() {
        let mut root = Root::new();
        let raw: [[u8; 2]; 4] = [*b"hi", *b"hi", *b"ha", *b"hi"];
        let mut nodes: Vec<Box<BytesNode<2>>> =
            raw.iter().map(|&k| Box::new(BytesNode::new(k))).collect();
        unsafe {
            insert_all(&mut root, &mut nodes, 2);
            let ptrs: Vec<NonNull<BytesNode<2>>> =
                nodes.iter_mut().map(|n| NonNull::from(&mut **n)).collect();

            assert_eq!(keys::<2>(&root), vec![*b"ha", *b"hi", *b"hi", *b"hi"]);

            // The three "hi" nodes come out in insertion order: 0, 1, 3.
            let first_hi = BytesNode::<2>::lookup(&root, b"hi").unwrap();
            assert_eq!(first_hi, ptrs[0]);
            let second = BytesNode::next(first_hi).unwrap();
            assert_eq!(second, ptrs[1]);
            let third = BytesNode::next(second).unwrap();
            assert_eq!(third, ptrs[3]);
            assert!(BytesNode::next(third).is_none());
        }
    }

    #[test]
    fn unique_mode_bytes() {
        let mut root = Root::new_unique();
        let mut a = Box::new(BytesNode::new(*b"key0"));
        let mut b = Box::new(BytesNode::new(*b"key0"));
        unsafe {
            let pa = NonNull::from(&mut *a);
            let pb = NonNull::from(&mut *b);
            assert_eq!(BytesNode::insert(&mut root, pa, 4), pa);
            assert_eq!(BytesNode::insert(&mut root, pb, 4), pa);
            assert!(!b.in_tree());
        }
    }

    #[test]
    fn delete_keeps_order() {
        let mut root = Root::new();
        let raw: [[u8; 3]; 5] = [*b"bbb", *b"aaa", *b"ccc", *b"abc", *b"bca"];
        let mut nodes: Vec<Box<BytesNode<3>>> =
            raw.iter().map(|&k| Box::new(BytesNode::new(k))).collect();
        unsafe {
            insert_all(&mut root, &mut nodes, 3);
            let victim = BytesNode::<3>::lookup(&root, b"abc").unwrap();
            BytesNode::delete(victim);
            assert_eq!(keys::<3>(&root), vec![*b"aaa", *b"bbb", *b"bca", *b"ccc"]);
            BytesNode::delete(victim);
            assert_eq!(keys::<3>(&root), vec![*b"aaa", *b"bbb", *b"bca", *b"ccc"]);
        }
    }

    // CIDR-shaped fixtures for the prefix variant.
    fn route(a: u8, b: u8, c: u8, d: u8, pfx: u32) -> Box<BytesNode<4>> {
        Box::new(BytesNode::new_prefix([a, b, c, d], pfx))
    }

    #[test]
    fn longest_prefix_match() {
        let mut root = Root::new();
        let mut routes = vec![
            route(10, 0, 0, 0, 8),
            route(10, 1, 0, 0, 16),
            route(10, 1, 2, 0, 24),
            route(192, 168, 0, 0, 16),
        ];
        unsafe {
            for r in &mut routes {
                BytesNode::insert_prefix(&mut root, NonNull::from(&mut **r), 4);
            }
            BytesNode::<4>::check(&root, false);

            let hit = BytesNode::<4>::lookup_longest(&root, &[10, 1, 2, 3]).unwrap();
            assert_eq!(hit.as_ref().prefix_len(), 24);

            let hit = BytesNode::<4>::lookup_longest(&root, &[10, 1, 9, 9]).unwrap();
            assert_eq!(hit.as_ref().prefix_len(), 16);
            assert_eq!(hit.as_ref().key(), &[10, 1, 0, 0]);

            let hit = BytesNode::<4>::lookup_longest(&root, &[10, 9, 9, 9]).unwrap();
            assert_eq!(hit.as_ref().prefix_len(), 8);

            let hit = BytesNode::<4>::lookup_longest(&root, &[192, 168, 77, 1]).unwrap();
            assert_eq!(hit.as_ref().key(), &[192, 168, 0, 0]);

            assert!(BytesNode::<4>::lookup_longest(&root, &[11, 0, 0, 0]).is_none());
            assert!(BytesNode::<4>::lookup_longest(&root, &[192, 169, 0, 0]).is_none());
        }
    }

    #[test]
    fn exact_prefix_lookup() {
        let mut root = Root::new();
        let mut routes = vec![
            route(10, 0, 0, 0, 8),
            route(10, 1, 0, 0, 16),
            route(10, 1, 2, 0, 24),
        ];
        unsafe {
            for r in &mut routes {
                BytesNode::insert_prefix(&mut root, NonNull::from(&mut **r), 4);
            }

            let hit = BytesNode::<4>::lookup_prefix(&root, &[10, 1, 0, 0], 16).unwrap();
            assert_eq!(hit.as_ref().key(), &[10, 1, 0, 0]);

            let hit = BytesNode::<4>::lookup_prefix(&root, &[10, 0, 0, 0], 8).unwrap();
            assert_eq!(hit.as_ref().prefix_len(), 8);

            let hit = BytesNode::<4>::lookup_prefix(&root, &[10, 1, 2, 0], 24).unwrap();
            assert_eq!(hit.as_ref().prefix_len(), 24);

            // Wrong length or wrong bits: no match.
            assert!(BytesNode::<4>::lookup_prefix(&root, &[10, 1, 0, 0], 12).is_none());
            assert!(BytesNode::<4>::lookup_prefix(&root, &[10, 2, 0, 0], 16).is_none());
            assert!(BytesNode::<4>::lookup_prefix(&root, &[10, 1, 3, 0], 24).is_none());
        }
    }

    #[test]
    fn prefix_duplicates_and_delete() {
        let mut root = Root::new();
        let mut routes = vec![
            route(10, 1, 0, 0, 16),
            route(10, 1, 0, 0, 16),
            route(10, 0, 0, 0, 8),
        ];
        unsafe {
            for r in &mut routes {
                BytesNode::insert_prefix(&mut root, NonNull::from(&mut **r), 4);
            }
            BytesNode::<4>::check(&root, false);
            let ptrs: Vec<NonNull<BytesNode<4>>> =
                routes.iter_mut().map(|r| NonNull::from(&mut **r)).collect();

            // Exact lookup returns the first of the two /16 entries.
            let hit = BytesNode::<4>::lookup_prefix(&root, &[10, 1, 0, 0], 16).unwrap();
            assert_eq!(hit, ptrs[0]);
            assert_eq!(BytesNode::next_dup(hit).unwrap(), ptrs[1]);

            // Dropping the covering /8 keeps the /16 reachable.
            BytesNode::delete(ptrs[2]);
            BytesNode::<4>::check(&root, false);
            let hit = BytesNode::<4>::lookup_longest(&root, &[10, 1, 2, 3]).unwrap();
            assert_eq!(hit, ptrs[0]);
            assert!(BytesNode::<4>::lookup_longest(&root, &[10, 9, 9, 9]).is_none());
        }
    }

    #[test]
    fn shorter_prefix_inserted_last_covers() {
        // The cover can arrive after the subtree it covers.
        let mut root = Root::new();
        let mut routes = vec![
            route(10, 1, 0, 0, 16),
            route(10, 2, 0, 0, 16),
            route(10, 0, 0, 0, 8),
        ];
        unsafe {
            for r in &mut routes {
                BytesNode::insert_prefix(&mut root, NonNull::from(&mut **r), 4);
            }
            let hit = BytesNode::<4>::lookup_longest(&root, &[10, 3, 0, 1]).unwrap();
            assert_eq!(hit.as_ref().prefix_len(), 8);
            let hit = BytesNode::<4>::lookup_longest(&root, &[10, 2, 0, 1]).unwrap();
            assert_eq!(hit.as_ref().key(), &[10, 2, 0, 0]);
        }
    }
}
