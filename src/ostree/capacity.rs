use super::{OSTree, TieBreak, next_tree_id};
use crate::raw::RawOSTree;

impl<K, V> OSTree<K, V> {
    /// Creates an empty tree with room for at least `capacity` nodes.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_ostree::OSTree;
    ///
    /// let tree: OSTree<i32> = OSTree::with_capacity(32);
    /// assert!(tree.is_empty());
    /// assert!(tree.capacity() >= 32);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_tie_break(capacity, TieBreak::default())
    }

    /// Creates an empty tree with room for at least `capacity` nodes and the
    /// given duplicate-key policy.
    #[must_use]
    pub fn with_capacity_and_tie_break(capacity: usize, tie_break: TieBreak) -> Self {
        OSTree {
            raw: RawOSTree::with_capacity(capacity, tie_break),
            id: next_tree_id(),
        }
    }

    /// Returns the number of nodes the tree can hold without reallocating.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Reserves room for at least `additional` more nodes.
    ///
    /// Node slots freed by deletions are reused before the arena grows.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_ostree::OSTree;
    ///
    /// let mut tree: OSTree<i32> = OSTree::new();
    /// tree.reserve(10);
    /// assert!(tree.capacity() >= 10);
    /// ```
    pub fn reserve(&mut self, additional: usize) {
        self.raw.reserve(additional);
    }
}
