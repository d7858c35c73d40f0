use core::ops::Index;

use super::{NodeRef, NodeView, OSTree};
use crate::Rank;

impl<K, V> OSTree<K, V> {
    /// Returns the node at one-based position `rank` in key order.
    ///
    /// Returns `None` if `rank` is 0 or greater than [`count`](OSTree::count).
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_ostree::OSTree;
    ///
    /// let mut tree = OSTree::new();
    /// tree.add("a", 10, 1.0).unwrap();
    /// tree.add("c", 30, 1.0).unwrap();
    /// tree.add("b", 20, 1.0).unwrap();
    ///
    /// assert_eq!(*tree.rank_select(2).unwrap().value(), 20);
    /// assert!(tree.rank_select(0).is_none());
    /// assert!(tree.rank_select(4).is_none());
    /// ```
    #[must_use]
    pub fn rank_select(&self, rank: usize) -> Option<NodeView<'_, K, V>> {
        self.view(self.raw.rank_select(rank))
    }

    /// Returns the node whose slice of the cumulative weight contains `weight`.
    ///
    /// Walking the nodes in key order, each node owns the half-open interval
    /// `(before, before + node.weight()]`, where `before` is the total weight
    /// of the nodes ahead of it. Zero-weight nodes own nothing and are never
    /// returned. Returns `None` unless `0 < weight <= total_weight()`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_ostree::OSTree;
    ///
    /// let mut tree = OSTree::new();
    /// tree.add('a', (), 1.0).unwrap();
    /// tree.add('b', (), 0.0).unwrap();
    /// tree.add('c', (), 2.0).unwrap();
    ///
    /// assert_eq!(*tree.weight_select(1.0).unwrap().key(), 'a');
    /// assert_eq!(*tree.weight_select(1.5).unwrap().key(), 'c');
    /// assert_eq!(*tree.weight_select(3.0).unwrap().key(), 'c');
    /// assert!(tree.weight_select(0.0).is_none());
    /// assert!(tree.weight_select(3.5).is_none());
    /// ```
    #[must_use]
    pub fn weight_select(&self, weight: f64) -> Option<NodeView<'_, K, V>> {
        self.view(self.raw.weight_select(weight))
    }

    /// Returns the one-based position of `node` in key order.
    ///
    /// Returns `None` if `node` is not a live node of this tree.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_ostree::OSTree;
    ///
    /// let mut tree: OSTree<i32> = OSTree::new();
    /// let nodes: Vec<_> = [30, 10, 20].into_iter().map(|k| tree.add_key(k).unwrap()).collect();
    ///
    /// assert_eq!(tree.rank_of(nodes[0]), Some(3));
    /// assert_eq!(tree.rank_of(nodes[1]), Some(1));
    /// ```
    #[must_use]
    pub fn rank_of(&self, node: NodeRef) -> Option<usize> {
        let handle = self.resolve(node).ok()?;
        Some(self.raw.rank_of(handle))
    }

    /// Returns the total weight of the nodes ordered before `node`.
    ///
    /// For a node with positive weight, `weight_select` of any value in
    /// `(weight_before, weight_before + weight]` returns that node.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn weight_before(&self, node: NodeRef) -> Option<f64> {
        let handle = self.resolve(node).ok()?;
        Some(self.raw.weight_before(handle))
    }
}

/// Indexes the tree's values by one-based rank.
///
/// # Panics
///
/// Panics if `rank` is out of bounds.
impl<K, V> Index<Rank> for OSTree<K, V> {
    type Output = V;

    fn index(&self, rank: Rank) -> &Self::Output {
        self.rank_select(rank.0).map(|n| n.value()).expect("rank out of bounds")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::{OSTree, Outcome, Rank};

    #[test]
    fn unit_weights_partition_the_range() {
        let tree: OSTree<i32> = (1..=100).map(Outcome::from_key).collect();

        for key in 1..=100 {
            let low = f64::from(key - 1);
            assert_eq!(*tree.weight_select(low + 0.5).unwrap().key(), key);
            assert_eq!(*tree.weight_select(low + 1.0).unwrap().key(), key);
        }
        assert!(tree.weight_select(100.5).is_none());
    }

    #[test]
    fn rank_and_weight_before_agree_with_iteration() {
        let tree: OSTree<i32> = (0..50).map(|k| Outcome::from_key(k).with_weight(f64::from(k % 4))).collect();

        let mut before = 0.0;
        for (i, node) in tree.iter().enumerate() {
            let node_ref = node.node_ref();
            assert_eq!(tree.rank_of(node_ref), Some(i + 1));
            assert_eq!(tree.weight_before(node_ref), Some(before));
            assert_eq!(tree.rank_select(i + 1).map(|n| n.node_ref()), Some(node_ref));
            before += node.weight();
        }
    }

    #[test]
    fn index_by_rank() {
        let tree: OSTree<&str, i32> = [Outcome::new("b", 2), Outcome::new("a", 1)].into();
        assert_eq!(tree[Rank(1)], 1);
        assert_eq!(tree[Rank(2)], 2);
    }

    #[test]
    #[should_panic(expected = "rank out of bounds")]
    fn index_rank_zero_panics() {
        let tree: OSTree<i32> = [Outcome::from_key(1)].into();
        let _value = &tree[Rank(0)];
    }

    #[test]
    fn stale_handle_has_no_rank() {
        let mut tree: OSTree<i32> = OSTree::new();
        let node = tree.add_key(1).unwrap();
        tree.delete(node).unwrap();
        assert_eq!(tree.rank_of(node), None);
        assert_eq!(tree.weight_before(node), None);
    }
}
