use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

use alloc::vec::Vec;
use log::debug;

use crate::error::{Error, Result};
use crate::raw::{Color, Handle, RawOSTree, Weight};

mod capacity;
mod order_statistic;
mod outcome;
mod sample;

pub use crate::raw::TieBreak;
pub use outcome::Outcome;
pub use sample::SampleIter;

static NEXT_TREE_ID: AtomicU32 = AtomicU32::new(0);

fn next_tree_id() -> u32 {
    NEXT_TREE_ID.fetch_add(1, AtomicOrdering::Relaxed)
}

/// Checks that `key` has a place in a total order.
fn validate_key<K: PartialOrd>(key: &K) -> Result<()> {
    match key.partial_cmp(key) {
        Some(Ordering::Equal) => Ok(()),
        _ => Err(Error::IncomparableKey),
    }
}

fn validate_weight(weight: f64) -> Result<Weight> {
    Weight::new(weight).ok_or(Error::InvalidWeight(weight))
}

/// Rejects `weight` if it would push the tree's total weight to infinity.
fn validate_total(total: f64, weight: f64) -> Result<()> {
    if total.is_finite() { Ok(()) } else { Err(Error::InvalidWeight(weight)) }
}

/// Validates a whole batch against a tree whose total weight is `total`,
/// before any of it is inserted.
fn validate_outcomes<K: PartialOrd, V>(outcomes: Vec<Outcome<K, V>>, mut total: f64) -> Result<Vec<(K, V, Weight)>> {
    let mut validated = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        validate_key(outcome.key())?;
        let weight = validate_weight(outcome.weight())?;
        total += weight.get();
        validate_total(total, weight.get())?;
        let (key, value, _) = outcome.into_parts();
        validated.push((key, value, weight));
    }
    Ok(validated)
}

/// An order-statistic red-black tree with weighted selection.
///
/// Each node stores a key, a value and a non-negative weight. Besides the
/// usual O(log n) insert, delete and search, the tree keeps every subtree's
/// node count and total weight, which gives:
///
/// - O(log n) [`rank_select`](OSTree::rank_select): the node at a one-based
///   position in key order,
/// - O(log n) [`weight_select`](OSTree::weight_select): the node whose slice
///   of the cumulative weight contains a given value, which is exactly what
///   weighted random sampling needs (see [`sample`](OSTree::sample)),
/// - O(1) [`minimum`](OSTree::minimum), [`maximum`](OSTree::maximum),
///   successor and predecessor, through cached boundaries and an in-order
///   linked chain.
///
/// Keys only need [`PartialOrd`]; a key that is not comparable with itself
/// (such as `f64::NAN`) is rejected, so `f64` keys work. Duplicate keys are
/// allowed and placed according to the tree's [`TieBreak`].
///
/// Inserting returns a [`NodeRef`], a small `Copy` handle used to delete the
/// node or change its weight later. Handles are checked: using one on another
/// tree, or after its node was deleted, returns an error instead of touching
/// an unrelated node.
///
/// # Examples
///
/// ```
/// use wabi_ostree::OSTree;
///
/// let mut tree: OSTree<i32> = OSTree::new();
/// for key in 1..=100 {
///     tree.add_key(key).unwrap();
/// }
///
/// assert_eq!(tree.count(), 100);
/// assert_eq!(*tree.minimum().unwrap().key(), 1);
/// assert_eq!(*tree.rank_select(42).unwrap().key(), 42);
/// assert_eq!(*tree.weight_select(50.5).unwrap().key(), 51);
///
/// let min = tree.minimum().unwrap().node_ref();
/// tree.delete(min).unwrap();
/// assert_eq!(*tree.minimum().unwrap().key(), 2);
/// ```
pub struct OSTree<K, V = K> {
    raw: RawOSTree<K, V>,
    id: u32,
}

/// A handle to a node of an [`OSTree`].
///
/// Handles are cheap to copy and stay valid until their node is deleted.
/// They are only meaningful to the tree that issued them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NodeRef {
    tree: u32,
    handle: Handle,
    generation: u32,
}

/// A borrowed view of one node of an [`OSTree`].
///
/// Views expose the node's contents, its balancing color and subtree
/// statistics, and its neighbors. Links that would lead to the tree's
/// sentinel are `None`.
pub struct NodeView<'a, K, V> {
    tree: &'a OSTree<K, V>,
    handle: Handle,
}

/// An iterator over the nodes of an `OSTree`, in key order.
///
/// This `struct` is created by the [`iter`] method on [`OSTree`]. It walks the
/// tree's in-order chain, so every step is O(1).
///
/// # Examples
///
/// ```
/// use wabi_ostree::OSTree;
///
/// let mut tree: OSTree<i32> = OSTree::new();
/// tree.add_key(2).unwrap();
/// tree.add_key(1).unwrap();
///
/// let mut iter = tree.iter();
/// assert_eq!(iter.next().map(|n| *n.key()), Some(1));
/// assert_eq!(iter.next_back().map(|n| *n.key()), Some(2));
/// assert!(iter.next().is_none());
/// ```
///
/// [`iter`]: OSTree::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    tree: &'a OSTree<K, V>,
    front: Handle,
    back: Handle,
    remaining: usize,
}

/// An iterator over the keys of an `OSTree`, in key order.
///
/// This `struct` is created by the [`keys`](OSTree::keys) method on [`OSTree`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

/// An iterator over the values of an `OSTree`, in key order.
///
/// This `struct` is created by the [`values`](OSTree::values) method on [`OSTree`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

/// An owning iterator over the outcomes of an `OSTree`, in key order.
///
/// This `struct` is created by the [`into_iter`] method on [`OSTree`]
/// (provided by the [`IntoIterator`] trait).
///
/// [`into_iter`]: IntoIterator::into_iter
pub struct IntoIter<K, V> {
    inner: alloc::vec::IntoIter<Outcome<K, V>>,
}

impl<K, V> OSTree<K, V> {
    /// Makes a new, empty `OSTree` that places duplicate keys to the right.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_ostree::OSTree;
    ///
    /// let tree: OSTree<i32> = OSTree::new();
    /// assert!(tree.is_empty());
    /// assert_eq!(tree.total_weight(), 0.0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_tie_break(TieBreak::default())
    }

    /// Makes a new, empty `OSTree` with the given duplicate-key policy.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_ostree::{OSTree, TieBreak};
    ///
    /// let mut tree = OSTree::with_tie_break(TieBreak::Left);
    /// tree.add(1, "first", 1.0).unwrap();
    /// tree.add(1, "second", 1.0).unwrap();
    ///
    /// let values: Vec<_> = tree.values().copied().collect();
    /// assert_eq!(values, ["second", "first"]);
    /// ```
    #[must_use]
    pub fn with_tie_break(tie_break: TieBreak) -> Self {
        OSTree {
            raw: RawOSTree::new(tie_break),
            id: next_tree_id(),
        }
    }

    /// Returns the duplicate-key policy of this tree.
    #[must_use]
    pub fn tie_break(&self) -> TieBreak {
        self.raw.tie_break()
    }

    /// Returns the number of nodes in the tree.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn count(&self) -> usize {
        self.raw.len()
    }

    /// Returns the number of nodes in the tree. Same as [`count`](OSTree::count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the tree holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the sum of the weights of all nodes.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.raw.total_weight()
    }

    /// Removes every node.
    ///
    /// Handles issued before the call are rejected afterwards with
    /// [`Error::ForeignNode`].
    pub fn clear(&mut self) {
        self.raw.clear();
        self.id = next_tree_id();
    }

    fn view(&self, handle: Handle) -> Option<NodeView<'_, K, V>> {
        (!handle.is_nil()).then_some(NodeView { tree: self, handle })
    }

    fn node_ref(&self, handle: Handle) -> NodeRef {
        NodeRef {
            tree: self.id,
            handle,
            generation: self.raw.generation(handle),
        }
    }

    /// Maps a public handle back to its arena slot.
    fn resolve(&self, node: NodeRef) -> Result<Handle> {
        if node.tree != self.id {
            return Err(Error::ForeignNode);
        }
        if !self.raw.is_live(node.handle, node.generation) {
            return Err(Error::StaleNode);
        }
        Ok(node.handle)
    }

    /// Returns `true` if `node` is a live node of this tree.
    #[must_use]
    pub fn contains(&self, node: NodeRef) -> bool {
        self.resolve(node).is_ok()
    }

    /// Returns a view of `node`, or `None` if the handle is not live in this tree.
    #[must_use]
    pub fn get(&self, node: NodeRef) -> Option<NodeView<'_, K, V>> {
        self.resolve(node).ok().and_then(|handle| self.view(handle))
    }

    /// Returns the key of `node`.
    #[must_use]
    pub fn key(&self, node: NodeRef) -> Option<&K> {
        self.get(node).map(|view| view.key())
    }

    /// Returns the value of `node`.
    #[must_use]
    pub fn value(&self, node: NodeRef) -> Option<&V> {
        self.get(node).map(|view| view.value())
    }

    /// Returns a mutable reference to the value of `node`.
    ///
    /// Values do not take part in ordering, so they can be changed freely.
    pub fn value_mut(&mut self, node: NodeRef) -> Option<&mut V> {
        let handle = self.resolve(node).ok()?;
        Some(self.raw.value_mut(handle))
    }

    /// Returns the weight of `node`.
    #[must_use]
    pub fn weight(&self, node: NodeRef) -> Option<f64> {
        self.get(node).map(|view| view.weight())
    }

    /// Returns the node with the smallest key.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn minimum(&self) -> Option<NodeView<'_, K, V>> {
        self.view(self.raw.minimum())
    }

    /// Returns the node with the largest key.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn maximum(&self) -> Option<NodeView<'_, K, V>> {
        self.view(self.raw.maximum())
    }

    /// Returns the node with the smallest key in the subtree rooted at `node`.
    ///
    /// # Complexity
    ///
    /// O(height of the subtree)
    #[must_use]
    pub fn min_at(&self, node: NodeRef) -> Option<NodeView<'_, K, V>> {
        let handle = self.resolve(node).ok()?;
        self.view(self.raw.min_at(handle))
    }

    /// Returns the node with the largest key in the subtree rooted at `node`.
    ///
    /// # Complexity
    ///
    /// O(height of the subtree)
    #[must_use]
    pub fn max_at(&self, node: NodeRef) -> Option<NodeView<'_, K, V>> {
        let handle = self.resolve(node).ok()?;
        self.view(self.raw.max_at(handle))
    }

    /// Returns the in-order successor of `node`.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn successor(&self, node: NodeRef) -> Option<NodeView<'_, K, V>> {
        self.get(node).and_then(|view| view.next())
    }

    /// Returns the in-order predecessor of `node`.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn predecessor(&self, node: NodeRef) -> Option<NodeView<'_, K, V>> {
        self.get(node).and_then(|view| view.prev())
    }

    /// Calls `visit` on `node`, then on each of its ancestors up to and
    /// including the root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ForeignNode`] or [`Error::StaleNode`] if `node` is not
    /// a live node of this tree; `visit` is not called.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_ostree::{Color, OSTree};
    ///
    /// let mut tree: OSTree<i32> = OSTree::new();
    /// let nodes: Vec<_> = (0..10).map(|k| tree.add_key(k).unwrap()).collect();
    ///
    /// let mut black = 0;
    /// tree.for_branch(nodes[0], |n| black += usize::from(n.color() == Color::Black)).unwrap();
    /// assert!(black >= 1);
    /// ```
    pub fn for_branch<F>(&self, node: NodeRef, mut visit: F) -> Result<()>
    where
        F: FnMut(NodeView<'_, K, V>),
    {
        let handle = self.resolve(node)?;
        self.raw.for_branch(handle, |h| visit(NodeView { tree: self, handle: h }));
        Ok(())
    }

    /// Changes the weight of `node`, returning its previous weight.
    ///
    /// The node keeps its place; only the statistics along its branch are
    /// recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWeight`] for a negative, NaN or infinite
    /// weight, or one that would make the total weight infinite, and
    /// [`Error::ForeignNode`] or [`Error::StaleNode`] for a handle that is not
    /// live in this tree. The tree is unchanged on error.
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
    /// let mut tree: OSTree<char> = OSTree::new();
    /// let a = tree.add_key('a').unwrap();
    /// tree.add_key('b').unwrap();
    ///
    /// assert_eq!(tree.set_weight(a, 3.0), Ok(1.0));
    /// assert_eq!(tree.total_weight(), 4.0);
    /// assert_eq!(*tree.weight_select(3.0).unwrap().key(), 'a');
    /// ```
    pub fn set_weight(&mut self, node: NodeRef, weight: f64) -> Result<f64> {
        let handle = self.resolve(node)?;
        let weight = validate_weight(weight)?;
        self.replace_weight(handle, weight)
    }

    /// Adds `delta` to the weight of `node`, returning its previous weight.
    ///
    /// # Errors
    ///
    /// Same as [`set_weight`](OSTree::set_weight); a delta that would make the
    /// weight negative is an [`Error::InvalidWeight`].
    pub fn increment_weight(&mut self, node: NodeRef, delta: f64) -> Result<f64> {
        let handle = self.resolve(node)?;
        let weight = validate_weight(self.raw.node(handle).weight().get() + delta)?;
        self.replace_weight(handle, weight)
    }

    fn replace_weight(&mut self, handle: Handle, weight: Weight) -> Result<f64> {
        let old = self.raw.node(handle).weight().get();
        validate_total(self.raw.total_weight() - old + weight.get(), weight.get())?;
        Ok(self.raw.set_weight(handle, weight).get())
    }

    /// Removes `node` from the tree and returns its contents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ForeignNode`] or [`Error::StaleNode`] if `node` is not
    /// a live node of this tree. The tree is unchanged on error.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_ostree::{Error, OSTree};
    ///
    /// let mut tree = OSTree::new();
    /// let node = tree.add("k", 7, 2.0).unwrap();
    ///
    /// let outcome = tree.delete(node).unwrap();
    /// assert_eq!(outcome.into_parts(), ("k", 7, 2.0));
    /// assert!(tree.is_empty());
    /// assert_eq!(tree.delete(node).unwrap_err(), Error::StaleNode);
    /// ```
    pub fn delete(&mut self, node: NodeRef) -> Result<Outcome<K, V>> {
        let handle = self.resolve(node)?;
        let (key, value, weight) = self.raw.remove(handle).into_parts();
        Ok(Outcome::new(key, value).with_weight(weight.get()))
    }

    /// Removes and returns the node with the smallest key.
    pub fn pop_first(&mut self) -> Option<Outcome<K, V>> {
        let handle = self.raw.minimum();
        (!handle.is_nil()).then(|| {
            let (key, value, weight) = self.raw.remove(handle).into_parts();
            Outcome::new(key, value).with_weight(weight.get())
        })
    }

    /// Removes and returns the node with the largest key.
    pub fn pop_last(&mut self) -> Option<Outcome<K, V>> {
        let handle = self.raw.maximum();
        (!handle.is_nil()).then(|| {
            let (key, value, weight) = self.raw.remove(handle).into_parts();
            Outcome::new(key, value).with_weight(weight.get())
        })
    }

    /// Gets an iterator over the nodes of the tree, in key order.
    ///
    /// Nodes with equal keys appear in the order given by the tree's
    /// [`TieBreak`].
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: self,
            front: self.raw.minimum(),
            back: self.raw.maximum(),
            remaining: self.raw.len(),
        }
    }

    /// Gets an iterator over the keys of the tree, in order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Gets an iterator over the values of the tree, in key order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K: PartialOrd, V> OSTree<K, V> {
    /// Builds a tree from a sequence of outcomes.
    ///
    /// Every outcome is validated before the first one is inserted, so an
    /// error never yields a half-built tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncomparableKey`] or [`Error::InvalidWeight`] for the
    /// first invalid outcome.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_ostree::{OSTree, Outcome};
    ///
    /// let tree = OSTree::from_outcomes([
    ///     Outcome::new("heads", 0).with_weight(3.0),
    ///     Outcome::new("tails", 1),
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(tree.count(), 2);
    /// assert_eq!(tree.total_weight(), 4.0);
    /// ```
    pub fn from_outcomes<I>(outcomes: I) -> Result<Self>
    where
        I: IntoIterator<Item = Outcome<K, V>>,
    {
        let validated = validate_outcomes(outcomes.into_iter().collect(), 0.0)?;

        debug!("building tree from {} outcomes", validated.len());
        let mut tree = Self::with_capacity(validated.len());
        for (key, value, weight) in validated {
            tree.raw.insert(key, value, weight);
        }
        Ok(tree)
    }

    /// Inserts an outcome, returning a handle to its new node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncomparableKey`] if the key is not comparable with
    /// itself, or [`Error::InvalidWeight`] for a negative, NaN or infinite
    /// weight, or one that would make the total weight infinite. The tree is
    /// unchanged on error.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, outcome: Outcome<K, V>) -> Result<NodeRef> {
        validate_key(outcome.key())?;
        let weight = validate_weight(outcome.weight())?;
        validate_total(self.raw.total_weight() + weight.get(), weight.get())?;
        let (key, value, _) = outcome.into_parts();
        let handle = self.raw.insert(key, value, weight);
        Ok(self.node_ref(handle))
    }

    /// Inserts a node with the given key, value and weight.
    ///
    /// # Errors
    ///
    /// See [`insert`](OSTree::insert).
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_ostree::{Error, OSTree};
    ///
    /// let mut tree = OSTree::new();
    /// let node = tree.add(1.5, "x", 0.25).unwrap();
    /// assert_eq!(tree.value(node), Some(&"x"));
    ///
    /// assert_eq!(tree.add(f64::NAN, "y", 1.0), Err(Error::IncomparableKey));
    /// assert_eq!(tree.add(2.0, "z", -1.0), Err(Error::InvalidWeight(-1.0)));
    /// assert_eq!(tree.count(), 1);
    /// ```
    pub fn add(&mut self, key: K, value: V, weight: f64) -> Result<NodeRef> {
        self.insert(Outcome::new(key, value).with_weight(weight))
    }

    /// Returns a node whose key equals `key`.
    ///
    /// With duplicate keys any one of the equal nodes may be returned.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn search<Q>(&self, key: &Q) -> Option<NodeView<'_, K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + PartialOrd,
    {
        self.view(self.raw.search(key))
    }

    /// Returns `true` if the tree holds a node with key `key`.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + PartialOrd,
    {
        !self.raw.search(key).is_nil()
    }
}

impl<K: PartialOrd + Clone> OSTree<K, K> {
    /// Inserts `key` with itself as the value and a weight of 1.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncomparableKey`] if the key is not comparable with itself.
    pub fn add_key(&mut self, key: K) -> Result<NodeRef> {
        self.insert(Outcome::from_key(key))
    }
}

impl<'a, K, V> NodeView<'a, K, V> {
    fn link(&self, handle: Handle) -> Option<NodeView<'a, K, V>> {
        self.tree.view(handle)
    }

    /// Returns a handle to this node, for later mutation through the tree.
    #[must_use]
    pub fn node_ref(&self) -> NodeRef {
        self.tree.node_ref(self.handle)
    }

    #[must_use]
    pub fn key(&self) -> &'a K {
        self.tree.raw.node(self.handle).key()
    }

    #[must_use]
    pub fn value(&self) -> &'a V {
        self.tree.raw.node(self.handle).value()
    }

    #[must_use]
    pub fn weight(&self) -> f64 {
        self.tree.raw.node(self.handle).weight().get()
    }

    #[must_use]
    pub fn color(&self) -> Color {
        self.tree.raw.node(self.handle).color
    }

    /// Number of nodes in the subtree rooted here, including this one.
    #[must_use]
    pub fn size(&self) -> usize {
        self.tree.raw.node(self.handle).size
    }

    /// Sum of weights in the subtree rooted here, including this one.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.tree.raw.node(self.handle).total_weight
    }

    #[must_use]
    pub fn left(&self) -> Option<NodeView<'a, K, V>> {
        self.link(self.tree.raw.node(self.handle).left)
    }

    #[must_use]
    pub fn right(&self) -> Option<NodeView<'a, K, V>> {
        self.link(self.tree.raw.node(self.handle).right)
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeView<'a, K, V>> {
        self.link(self.tree.raw.node(self.handle).parent)
    }

    /// The in-order successor.
    #[must_use]
    pub fn next(&self) -> Option<NodeView<'a, K, V>> {
        self.link(self.tree.raw.node(self.handle).next)
    }

    /// The in-order predecessor.
    #[must_use]
    pub fn prev(&self) -> Option<NodeView<'a, K, V>> {
        self.link(self.tree.raw.node(self.handle).prev)
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.handle == self.tree.raw.root()
    }

    /// Returns `true` if neither child is a real node.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        let node = self.tree.raw.node(self.handle);
        node.left.is_nil() && node.right.is_nil()
    }
}

impl<K, V> Clone for NodeView<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for NodeView<'_, K, V> {}

impl<K, V> PartialEq for NodeView<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.tree, other.tree) && self.handle == other.handle
    }
}

impl<K, V> Eq for NodeView<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for NodeView<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeView")
            .field("key", self.key())
            .field("value", self.value())
            .field("weight", &self.weight())
            .field("color", &self.color())
            .field("size", &self.size())
            .field("total_weight", &self.total_weight())
            .finish()
    }
}

impl<K: Clone, V: Clone> Clone for OSTree<K, V> {
    /// Clones the tree. The clone issues its own handles, so handles from
    /// the source tree are foreign to it.
    fn clone(&self) -> Self {
        OSTree {
            raw: self.raw.clone(),
            id: next_tree_id(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OSTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter().map(|n| (n.key(), n.value()))).finish()
    }
}

impl<K, V> Default for OSTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a tree from outcomes.
///
/// # Panics
///
/// Panics on an invalid key or weight; use [`OSTree::from_outcomes`] to handle
/// those as errors.
impl<K: PartialOrd, V> FromIterator<Outcome<K, V>> for OSTree<K, V> {
    fn from_iter<I: IntoIterator<Item = Outcome<K, V>>>(iter: I) -> Self {
        match Self::from_outcomes(iter) {
            Ok(tree) => tree,
            Err(err) => panic!("invalid outcome: {err}"),
        }
    }
}

/// # Panics
///
/// Panics on an invalid key or weight. The whole batch is checked first, so a
/// panic leaves the tree as it was.
impl<K: PartialOrd, V> Extend<Outcome<K, V>> for OSTree<K, V> {
    fn extend<I: IntoIterator<Item = Outcome<K, V>>>(&mut self, iter: I) {
        match validate_outcomes(iter.into_iter().collect(), self.raw.total_weight()) {
            Ok(validated) => {
                self.raw.reserve(validated.len());
                for (key, value, weight) in validated {
                    self.raw.insert(key, value, weight);
                }
            }
            Err(err) => panic!("invalid outcome: {err}"),
        }
    }
}

impl<K: PartialOrd, V, const N: usize> From<[Outcome<K, V>; N]> for OSTree<K, V> {
    fn from(arr: [Outcome<K, V>; N]) -> Self {
        Self::from_iter(arr)
    }
}

impl<'a, K, V> IntoIterator for &'a OSTree<K, V> {
    type Item = NodeView<'a, K, V>;
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K, V> IntoIterator for OSTree<K, V> {
    type Item = Outcome<K, V>;
    type IntoIter = IntoIter<K, V>;

    fn into_iter(mut self) -> IntoIter<K, V> {
        let outcomes: Vec<Outcome<K, V>> = self
            .raw
            .drain_in_order()
            .into_iter()
            .map(|(key, value, weight)| Outcome::new(key, value).with_weight(weight.get()))
            .collect();
        IntoIter {
            inner: outcomes.into_iter(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = NodeView<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let handle = self.front;
        self.front = self.tree.raw.node(handle).next;
        self.remaining -= 1;
        Some(NodeView { tree: self.tree, handle })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let handle = self.back;
        self.back = self.tree.raw.node(handle).prev;
        self.remaining -= 1;
        Some(NodeView { tree: self.tree, handle })
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|n| n.key())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|n| n.key())
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|n| n.value())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|n| n.value())
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = Outcome<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn handles_are_checked() {
        let mut a: OSTree<i32> = OSTree::new();
        let mut b: OSTree<i32> = OSTree::new();
        let na = a.add_key(1).unwrap();
        let nb = b.add_key(1).unwrap();

        // Same slot, different trees.
        assert_eq!(na.handle, nb.handle);
        assert_eq!(a.delete(nb).unwrap_err(), Error::ForeignNode);
        assert_eq!(a.set_weight(nb, 2.0).unwrap_err(), Error::ForeignNode);
        assert!(a.get(nb).is_none());
        assert_eq!(a.count(), 1);

        a.delete(na).unwrap();
        assert_eq!(a.delete(na).unwrap_err(), Error::StaleNode);

        // The slot is reused but the old handle stays dead.
        let again = a.add_key(2).unwrap();
        assert_eq!(again.handle, na.handle);
        assert!(!a.contains(na));
        assert!(a.contains(again));
        assert_eq!(a.key(na), None);
        assert_eq!(a.key(again), Some(&2));
    }

    #[test]
    fn clear_invalidates_handles() {
        let mut tree: OSTree<i32> = OSTree::new();
        let node = tree.add_key(1).unwrap();
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.delete(node).unwrap_err(), Error::ForeignNode);

        let fresh = tree.add_key(1).unwrap();
        assert!(tree.contains(fresh));
    }

    #[test]
    fn clone_issues_its_own_handles() {
        let mut tree: OSTree<i32> = OSTree::new();
        let node = tree.add_key(1).unwrap();
        let mut copy = tree.clone();

        assert_eq!(copy.delete(node).unwrap_err(), Error::ForeignNode);
        let in_copy = copy.search(&1).unwrap().node_ref();
        copy.delete(in_copy).unwrap();
        assert!(copy.is_empty());
        assert_eq!(tree.count(), 1);
    }

    #[test]
    fn invalid_arguments_leave_tree_unchanged() {
        let mut tree: OSTree<f64> = OSTree::new();
        let node = tree.add_key(1.0).unwrap();

        assert_eq!(tree.add_key(f64::NAN).unwrap_err(), Error::IncomparableKey);
        assert_eq!(tree.add(2.0, 2.0, f64::INFINITY).unwrap_err(), Error::InvalidWeight(f64::INFINITY));
        assert_eq!(tree.set_weight(node, -0.5).unwrap_err(), Error::InvalidWeight(-0.5));
        assert_eq!(tree.increment_weight(node, -2.0).unwrap_err(), Error::InvalidWeight(-1.0));

        assert_eq!(tree.count(), 1);
        assert_eq!(tree.total_weight(), 1.0);
        tree.raw.validate_invariants();
    }

    #[test]
    fn from_outcomes_validates_everything_first() {
        let result = OSTree::from_outcomes([
            Outcome::from_key(1.0),
            Outcome::from_key(2.0),
            Outcome::from_key(3.0).with_weight(-1.0),
        ]);
        assert_eq!(result.unwrap_err(), Error::InvalidWeight(-1.0));
    }

    #[test]
    fn pop_first_and_last() {
        let mut tree: OSTree<i32> = (1..=5).map(Outcome::from_key).collect();
        assert_eq!(tree.pop_first().map(|o| *o.key()), Some(1));
        assert_eq!(tree.pop_last().map(|o| *o.key()), Some(5));
        tree.raw.validate_invariants();
        assert_eq!(tree.keys().copied().collect::<Vec<_>>(), [2, 3, 4]);

        let mut empty: OSTree<i32> = OSTree::new();
        assert!(empty.pop_first().is_none());
        assert!(empty.pop_last().is_none());
    }

    #[test]
    fn iterators_meet_in_the_middle() {
        let tree: OSTree<i32> = (1..=6).map(Outcome::from_key).collect();
        let mut iter = tree.iter();
        assert_eq!(iter.len(), 6);
        assert_eq!(iter.next().map(|n| *n.key()), Some(1));
        assert_eq!(iter.next_back().map(|n| *n.key()), Some(6));
        assert_eq!(iter.next().map(|n| *n.key()), Some(2));
        assert_eq!(iter.next_back().map(|n| *n.key()), Some(5));
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.clone().count(), 2);
        assert_eq!(iter.next().map(|n| *n.key()), Some(3));
        assert_eq!(iter.next().map(|n| *n.key()), Some(4));
        assert!(iter.next().is_none());
        assert!(iter.next_back().is_none());
    }

    #[test]
    #[should_panic(expected = "invalid outcome")]
    fn from_iter_panics_on_invalid_weight() {
        let _: OSTree<i32> = [Outcome::from_key(1).with_weight(f64::NAN)].into_iter().collect();
    }

    #[test]
    fn weights_that_overflow_the_total_are_rejected() {
        let mut tree: OSTree<i32> = OSTree::new();
        let big = tree.add(1, 1, 1e308).unwrap();
        let small = tree.add(2, 2, 1.0).unwrap();

        assert_eq!(tree.add(3, 3, 1e308).unwrap_err(), Error::InvalidWeight(1e308));
        assert_eq!(tree.set_weight(small, 1e308).unwrap_err(), Error::InvalidWeight(1e308));
        assert_eq!(tree.increment_weight(small, 1e308).unwrap_err(), Error::InvalidWeight(1e308));

        assert_eq!(tree.count(), 2);
        assert_eq!(tree.weight(small), Some(1.0));
        assert!(tree.total_weight().is_finite());
        assert!(tree.weight_select(f64::INFINITY).is_none());
        tree.raw.validate_invariants();

        // Replacing the large weight only counts the difference.
        assert_eq!(tree.set_weight(big, 1.5e308).unwrap(), 1e308);
        assert_eq!(tree.increment_weight(big, -0.5e308).unwrap(), 1.5e308);
        tree.raw.validate_invariants();
    }

    #[test]
    fn from_outcomes_rejects_an_overflowing_total() {
        let result = OSTree::from_outcomes([Outcome::from_key(1).with_weight(1e308), Outcome::from_key(2).with_weight(1e308)]);
        assert_eq!(result.unwrap_err(), Error::InvalidWeight(1e308));
    }

    #[test]
    fn extend_checks_the_batch_before_inserting() {
        let mut tree: OSTree<i32> = (1..=3).map(Outcome::from_key).collect();
        let batch = [Outcome::from_key(4), Outcome::from_key(5), Outcome::from_key(6).with_weight(-1.0)];

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| tree.extend(batch)));
        assert!(result.is_err());
        assert_eq!(tree.keys().copied().collect::<Vec<_>>(), [1, 2, 3]);
        assert_eq!(tree.total_weight(), 3.0);
        tree.raw.validate_invariants();

        let overflow = [Outcome::from_key(7).with_weight(1e308), Outcome::from_key(8).with_weight(1e308)];
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| tree.extend(overflow)));
        assert!(result.is_err());
        assert_eq!(tree.count(), 3);

        tree.extend([Outcome::from_key(0), Outcome::from_key(4)]);
        assert_eq!(tree.keys().copied().collect::<Vec<_>>(), [0, 1, 2, 3, 4]);
        tree.raw.validate_invariants();
    }
}
