use core::iter::FusedIterator;

use rand::Rng;
use rand::distributions::Standard;

use super::{NodeView, OSTree};

impl<K, V> OSTree<K, V> {
    /// Draws a node at random, each with probability proportional to its weight.
    ///
    /// Returns `None` when the total weight is zero.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    /// use wabi_ostree::OSTree;
    ///
    /// let mut tree = OSTree::new();
    /// tree.add("never", (), 0.0).unwrap();
    /// tree.add("always", (), 2.0).unwrap();
    ///
    /// let mut rng = StdRng::seed_from_u64(7);
    /// for _ in 0..10 {
    ///     assert_eq!(*tree.sample(&mut rng).unwrap().key(), "always");
    /// }
    /// ```
    pub fn sample<R>(&self, rng: &mut R) -> Option<NodeView<'_, K, V>>
    where
        R: Rng + ?Sized,
    {
        let total = self.total_weight();
        if total <= 0.0 {
            return None;
        }
        // `u` is in [0, 1), so the draw lands in (0, total].
        let u: f64 = rng.sample(Standard);
        self.weight_select((1.0 - u) * total)
    }

    /// Returns an endless iterator of weighted samples.
    ///
    /// The iterator ends only if the tree has no positive weight.
    ///
    /// # Examples
    ///
    /// ```
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    /// use wabi_ostree::{OSTree, Outcome};
    ///
    /// let tree = OSTree::from([
    ///     Outcome::new("heads", ()).with_weight(1.0),
    ///     Outcome::new("tails", ()).with_weight(1.0),
    /// ]);
    ///
    /// let flips: Vec<_> = tree.sample_iter(StdRng::seed_from_u64(1)).take(20).map(|n| *n.key()).collect();
    /// assert_eq!(flips.len(), 20);
    /// assert!(flips.iter().all(|k| *k == "heads" || *k == "tails"));
    /// ```
    pub fn sample_iter<R: Rng>(&self, rng: R) -> SampleIter<'_, K, V, R> {
        SampleIter { tree: self, rng }
    }
}

/// An endless iterator of weighted samples from an `OSTree`.
///
/// This `struct` is created by the [`sample_iter`](OSTree::sample_iter) method
/// on [`OSTree`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct SampleIter<'a, K, V, R> {
    tree: &'a OSTree<K, V>,
    rng: R,
}

impl<'a, K, V, R: Rng> Iterator for SampleIter<'a, K, V, R> {
    type Item = NodeView<'a, K, V>;

    fn next(&mut self) -> Option<NodeView<'a, K, V>> {
        self.tree.sample(&mut self.rng)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.tree.total_weight() > 0.0 { (usize::MAX, None) } else { (0, Some(0)) }
    }
}

// A tree borrowed by the iterator cannot change, so an empty draw stays empty.
impl<K, V, R: Rng> FusedIterator for SampleIter<'_, K, V, R> {}
