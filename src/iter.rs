//! Leaf iteration.

use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::node::{Root, TreeNode};

/// Iterates every leaf of a tree in key order (duplicates in insertion
/// order), yielding shared references. The borrow on the root keeps the
/// tree from being mutated through safe code for the iterator's lifetime;
/// upholding that for the unsafely-shared nodes is the creator's job.
#[derive(Debug)]
pub struct Iter<'a, T: TreeNode> {
    next: Option<NonNull<T>>,
    _tree: PhantomData<&'a Root>,
}

impl<'a, T: TreeNode> Iter<'a, T> {
    /// # Safety
    ///
    /// Every node linked under `root` must be a live `T` and must not be
    /// mutated or unlinked while the iterator exists.
    pub unsafe fn new(root: &'a Root) -> Iter<'a, T> {
        Iter {
            next: T::first(root),
            _tree: PhantomData,
        }
    }
}

impl<'a, T: TreeNode + 'a> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let cur = self.next?;
        self.next = unsafe { T::next(cur) };
        Some(unsafe { &*cur.as_ptr() })
    }
}

/// The distinct-keys counterpart of [`Iter`]: yields one leaf per key,
/// the first insertion of each.
#[derive(Debug)]
pub struct UniqueIter<'a, T: TreeNode> {
    next: Option<NonNull<T>>,
    _tree: PhantomData<&'a Root>,
}

impl<'a, T: TreeNode> UniqueIter<'a, T> {
    /// # Safety
    /// As [`Iter::new`].
    pub unsafe fn new(root: &'a Root) -> UniqueIter<'a, T> {
        UniqueIter {
            next: T::first(root),
            _tree: PhantomData,
        }
    }
}

impl<'a, T: TreeNode + 'a> Iterator for UniqueIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let cur = self.next?;
        self.next = unsafe { T::next_unique(cur) };
        Some(unsafe { &*cur.as_ptr() })
    }
}
