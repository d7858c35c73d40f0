use core::borrow::Borrow;
use core::cmp::Ordering;

use alloc::vec::Vec;
use log::{debug, trace};

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Color, Node};
use super::weight::Weight;

/// Which side of an existing node a new node with an equal key is attached to.
///
/// With [`TieBreak::Right`] (the default) equal keys iterate in insertion
/// order; with [`TieBreak::Left`] they iterate in reverse insertion order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum TieBreak {
    #[default]
    Right,
    Left,
}

/// The core red-black tree backing `OSTree`.
///
/// Every node lives in `nodes`; slot 0 is the tree's own sentinel. All links
/// are handles into the arena, so parent/child and next/prev cycles never
/// involve ownership.
#[derive(Clone)]
pub(crate) struct RawOSTree<K, V> {
    /// Arena storing the sentinel and all tree nodes.
    nodes: Arena<Node<K, V>>,
    /// Root of the tree, `Handle::NIL` when empty.
    root: Handle,
    /// Node with the smallest key, `Handle::NIL` when empty.
    minimum: Handle,
    /// Node with the largest key, `Handle::NIL` when empty.
    maximum: Handle,
    tie_break: TieBreak,
}

impl<K, V> RawOSTree<K, V> {
    /// Creates a new, empty tree.
    pub(crate) fn new(tie_break: TieBreak) -> Self {
        Self::with_arena(Arena::new(), tie_break)
    }

    /// Creates a new tree with room for `capacity` nodes.
    pub(crate) fn with_capacity(capacity: usize, tie_break: TieBreak) -> Self {
        Self::with_arena(Arena::with_capacity(capacity.saturating_add(1)), tie_break)
    }

    fn with_arena(mut nodes: Arena<Node<K, V>>, tie_break: TieBreak) -> Self {
        let nil = nodes.alloc(Node::sentinel());
        debug_assert!(nil.is_nil());
        Self {
            nodes,
            root: Handle::NIL,
            minimum: Handle::NIL,
            maximum: Handle::NIL,
            tie_break,
        }
    }

    /// Returns the number of nodes the tree can hold without reallocating.
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity().saturating_sub(1)
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional);
    }

    /// Returns the number of nodes in the tree.
    pub(crate) fn len(&self) -> usize {
        debug_assert_eq!(self.node(self.root).size + 1, self.nodes.len());
        self.node(self.root).size
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_nil()
    }

    /// Returns the sum of all node weights.
    pub(crate) fn total_weight(&self) -> f64 {
        self.node(self.root).total_weight
    }

    pub(crate) fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    pub(crate) fn root(&self) -> Handle {
        self.root
    }

    pub(crate) fn minimum(&self) -> Handle {
        self.minimum
    }

    pub(crate) fn maximum(&self) -> Handle {
        self.maximum
    }

    /// Removes every node, leaving a fresh sentinel.
    pub(crate) fn clear(&mut self) {
        debug!("clearing tree of {} nodes", self.len());
        self.nodes.clear();
        let nil = self.nodes.alloc(Node::sentinel());
        debug_assert!(nil.is_nil());
        self.root = Handle::NIL;
        self.minimum = Handle::NIL;
        self.maximum = Handle::NIL;
    }

    /// Removes every node, returning their contents in key order.
    pub(crate) fn drain_in_order(&mut self) -> Vec<(K, V, Weight)> {
        let mut result = Vec::with_capacity(self.len());
        let mut current = self.minimum;

        while !current.is_nil() {
            let node = self.nodes.take(current);
            current = node.next;
            result.push(node.into_parts());
        }

        self.root = Handle::NIL;
        self.clear();
        result
    }

    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    #[inline]
    fn node_mut(&mut self, handle: Handle) -> &mut Node<K, V> {
        self.nodes.get_mut(handle)
    }

    /// Returns a mutable reference to the value stored at `handle`.
    pub(crate) fn value_mut(&mut self, handle: Handle) -> &mut V {
        self.node_mut(handle).value_mut()
    }

    pub(crate) fn generation(&self, handle: Handle) -> u32 {
        self.nodes.generation(handle)
    }

    /// Returns `true` if `handle` is a real node of this tree at `generation`.
    pub(crate) fn is_live(&self, handle: Handle, generation: u32) -> bool {
        !handle.is_nil() && self.nodes.is_live(handle, generation)
    }

    #[inline]
    fn left(&self, handle: Handle) -> Handle {
        self.node(handle).left
    }

    #[inline]
    fn right(&self, handle: Handle) -> Handle {
        self.node(handle).right
    }

    #[inline]
    fn parent(&self, handle: Handle) -> Handle {
        self.node(handle).parent
    }

    #[inline]
    fn color(&self, handle: Handle) -> Color {
        self.node(handle).color
    }

    #[inline]
    fn set_color(&mut self, handle: Handle, color: Color) {
        self.node_mut(handle).color = color;
    }

    /// Returns the leftmost node of the subtree rooted at `handle`.
    pub(crate) fn min_at(&self, mut handle: Handle) -> Handle {
        if handle.is_nil() {
            return handle;
        }
        while !self.left(handle).is_nil() {
            handle = self.left(handle);
        }
        handle
    }

    /// Returns the rightmost node of the subtree rooted at `handle`.
    pub(crate) fn max_at(&self, mut handle: Handle) -> Handle {
        if handle.is_nil() {
            return handle;
        }
        while !self.right(handle).is_nil() {
            handle = self.right(handle);
        }
        handle
    }

    /// Calls `f` on `handle` and each of its ancestors up to and including the root.
    pub(crate) fn for_branch<F>(&self, mut handle: Handle, mut f: F)
    where
        F: FnMut(Handle),
    {
        while !handle.is_nil() {
            f(handle);
            handle = self.parent(handle);
        }
    }

    /// Recomputes `size` and `total_weight` of a real node from its children.
    fn update_stats(&mut self, handle: Handle) {
        debug_assert!(!handle.is_nil(), "the sentinel's statistics are fixed");
        let node = self.node(handle);
        let (left, right) = (self.node(node.left), self.node(node.right));
        let size = left.size + right.size + 1;
        let total_weight = left.total_weight + right.total_weight + node.weight().get();

        let node = self.node_mut(handle);
        node.size = size;
        node.total_weight = total_weight;
    }

    /// Recomputes statistics from `handle` up to the root.
    fn update_stats_along_branch(&mut self, mut handle: Handle) {
        while !handle.is_nil() {
            self.update_stats(handle);
            handle = self.parent(handle);
        }
    }

    /// Replaces `weight` of the node at `handle`, returning the old weight.
    pub(crate) fn set_weight(&mut self, handle: Handle, weight: Weight) -> Weight {
        let old = self.node(handle).weight();
        self.node_mut(handle).set_weight(weight);
        self.update_stats_along_branch(handle);
        old
    }

    fn rotate_left(&mut self, x: Handle) {
        let y = self.right(x);
        let y_left = self.left(y);

        self.node_mut(x).right = y_left;
        if !y_left.is_nil() {
            self.node_mut(y_left).parent = x;
        }

        let parent = self.parent(x);
        self.node_mut(y).parent = parent;
        if parent.is_nil() {
            self.root = y;
        } else if x == self.left(parent) {
            self.node_mut(parent).left = y;
        } else {
            self.node_mut(parent).right = y;
        }

        self.node_mut(y).left = x;
        self.node_mut(x).parent = y;

        // `x` is now the child, so it goes first.
        self.update_stats(x);
        self.update_stats(y);
    }

    fn rotate_right(&mut self, x: Handle) {
        let y = self.left(x);
        let y_right = self.right(y);

        self.node_mut(x).left = y_right;
        if !y_right.is_nil() {
            self.node_mut(y_right).parent = x;
        }

        let parent = self.parent(x);
        self.node_mut(y).parent = parent;
        if parent.is_nil() {
            self.root = y;
        } else if x == self.right(parent) {
            self.node_mut(parent).right = y;
        } else {
            self.node_mut(parent).left = y;
        }

        self.node_mut(y).right = x;
        self.node_mut(x).parent = y;

        self.update_stats(x);
        self.update_stats(y);
    }

    fn insert_fixup(&mut self, mut z: Handle) {
        while self.color(self.parent(z)) == Color::Red {
            let parent = self.parent(z);
            let grandparent = self.parent(parent);

            if parent == self.left(grandparent) {
                let uncle = self.right(grandparent);
                if self.color(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    z = grandparent;
                } else {
                    if z == self.right(parent) {
                        z = parent;
                        self.rotate_left(z);
                    }
                    let parent = self.parent(z);
                    let grandparent = self.parent(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_right(grandparent);
                }
            } else {
                let uncle = self.left(grandparent);
                if self.color(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    z = grandparent;
                } else {
                    if z == self.left(parent) {
                        z = parent;
                        self.rotate_right(z);
                    }
                    let parent = self.parent(z);
                    let grandparent = self.parent(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_left(grandparent);
                }
            }
        }

        let root = self.root;
        self.set_color(root, Color::Black);
    }

    /// Puts `v` in the place of `u` under `u`'s parent.
    ///
    /// `v` may be the sentinel, whose parent link is then borrowed until the
    /// delete that called this finishes.
    fn transplant(&mut self, u: Handle, v: Handle) {
        let parent = self.parent(u);
        if parent.is_nil() {
            self.root = v;
        } else if u == self.left(parent) {
            self.node_mut(parent).left = v;
        } else {
            self.node_mut(parent).right = v;
        }
        self.node_mut(v).parent = parent;
    }

    /// Unlinks the node at `z` from the tree and returns it.
    pub(crate) fn remove(&mut self, z: Handle) -> Node<K, V> {
        debug_assert!(!z.is_nil() && !self.node(z).is_sentinel(), "cannot remove the sentinel");

        // Splice `z` out of the in-order chain.
        let (prev, next) = (self.node(z).prev, self.node(z).next);
        if !prev.is_nil() {
            self.node_mut(prev).next = next;
        }
        if !next.is_nil() {
            self.node_mut(next).prev = prev;
        }

        // A boundary node has no child on its outer side, so its neighbor is
        // either in the inner subtree or is its parent.
        if z == self.minimum {
            let right = self.right(z);
            self.minimum = if right.is_nil() { self.parent(z) } else { self.min_at(right) };
        }
        if z == self.maximum {
            let left = self.left(z);
            self.maximum = if left.is_nil() { self.parent(z) } else { self.max_at(left) };
        }

        let mut removed_color = self.color(z);
        let x;

        if self.left(z).is_nil() {
            trace!("remove: node has no left child");
            x = self.right(z);
            self.transplant(z, x);
        } else if self.right(z).is_nil() {
            trace!("remove: node has no right child");
            x = self.left(z);
            self.transplant(z, x);
        } else {
            trace!("remove: node has two children, splicing in its successor");
            let y = self.min_at(self.right(z));
            removed_color = self.color(y);
            x = self.right(y);

            if self.parent(y) == z {
                self.node_mut(x).parent = y;
            } else {
                self.transplant(y, x);
                let right = self.right(z);
                self.node_mut(y).right = right;
                self.node_mut(right).parent = y;
            }

            self.transplant(z, y);
            let left = self.left(z);
            self.node_mut(y).left = left;
            self.node_mut(left).parent = y;
            let color = self.color(z);
            self.set_color(y, color);
        }

        // Everything above the splice point lost `z`.
        self.update_stats_along_branch(self.parent(x));

        if removed_color == Color::Black {
            self.delete_fixup(x);
        }

        // Return the borrowed parent link.
        self.node_mut(Handle::NIL).parent = Handle::NIL;

        self.nodes.take(z)
    }

    fn delete_fixup(&mut self, mut x: Handle) {
        while x != self.root && self.color(x) == Color::Black {
            let parent = self.parent(x);

            if x == self.left(parent) {
                let mut sibling = self.right(parent);
                if self.color(sibling) == Color::Red {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_left(parent);
                    sibling = self.right(self.parent(x));
                }

                if self.color(self.left(sibling)) == Color::Black && self.color(self.right(sibling)) == Color::Black {
                    self.set_color(sibling, Color::Red);
                    x = self.parent(x);
                } else {
                    if self.color(self.right(sibling)) == Color::Black {
                        let nephew = self.left(sibling);
                        self.set_color(nephew, Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_right(sibling);
                        sibling = self.right(self.parent(x));
                    }

                    let parent = self.parent(x);
                    let color = self.color(parent);
                    self.set_color(sibling, color);
                    self.set_color(parent, Color::Black);
                    let nephew = self.right(sibling);
                    self.set_color(nephew, Color::Black);
                    self.rotate_left(parent);
                    x = self.root;
                }
            } else {
                let mut sibling = self.left(parent);
                if self.color(sibling) == Color::Red {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_right(parent);
                    sibling = self.left(self.parent(x));
                }

                if self.color(self.right(sibling)) == Color::Black && self.color(self.left(sibling)) == Color::Black {
                    self.set_color(sibling, Color::Red);
                    x = self.parent(x);
                } else {
                    if self.color(self.left(sibling)) == Color::Black {
                        let nephew = self.right(sibling);
                        self.set_color(nephew, Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_left(sibling);
                        sibling = self.left(self.parent(x));
                    }

                    let parent = self.parent(x);
                    let color = self.color(parent);
                    self.set_color(sibling, color);
                    self.set_color(parent, Color::Black);
                    let nephew = self.left(sibling);
                    self.set_color(nephew, Color::Black);
                    self.rotate_right(parent);
                    x = self.root;
                }
            }
        }

        self.set_color(x, Color::Black);
    }

    /// Returns the node with one-based in-order rank `rank`, or `Handle::NIL`.
    pub(crate) fn rank_select(&self, mut rank: usize) -> Handle {
        if rank == 0 || rank > self.len() {
            return Handle::NIL;
        }

        let mut current = self.root;
        while !current.is_nil() {
            let node = self.node(current);
            let here = self.node(node.left).size + 1;
            match rank.cmp(&here) {
                Ordering::Equal => return current,
                Ordering::Less => current = node.left,
                Ordering::Greater => {
                    rank -= here;
                    current = node.right;
                }
            }
        }

        Handle::NIL
    }

    /// Returns the node whose weight interval `(before, before + weight]`
    /// contains `weight`, or `Handle::NIL` outside `(0, total_weight]`.
    pub(crate) fn weight_select(&self, mut weight: f64) -> Handle {
        if !(weight > 0.0 && weight <= self.total_weight()) {
            return Handle::NIL;
        }

        let mut current = self.root;
        let mut fallback = Handle::NIL;

        while !current.is_nil() {
            let node = self.node(current);
            let before = self.node(node.left).total_weight;
            let through = before + node.weight().get();

            if node.weight().is_positive() {
                fallback = current;
            }

            if weight <= before {
                current = node.left;
            } else if weight <= through {
                return current;
            } else {
                weight -= through;
                current = node.right;
            }
        }

        // Only reachable when subtraction rounding pushed `weight` past a
        // subtree's total.
        debug!("weight_select: rounding overshoot, using last positive-weight node on the path");
        fallback
    }

    /// Returns the one-based in-order rank of the node at `handle`.
    pub(crate) fn rank_of(&self, handle: Handle) -> usize {
        let mut rank = self.node(self.left(handle)).size + 1;
        let mut current = handle;

        while current != self.root {
            let parent = self.parent(current);
            if current == self.right(parent) {
                rank += self.node(self.left(parent)).size + 1;
            }
            current = parent;
        }

        rank
    }

    /// Returns the total weight of all nodes ordered before `handle`.
    pub(crate) fn weight_before(&self, handle: Handle) -> f64 {
        let mut before = self.node(self.left(handle)).total_weight;
        let mut current = handle;

        while current != self.root {
            let parent = self.parent(current);
            if current == self.right(parent) {
                let node = self.node(parent);
                before += self.node(node.left).total_weight + node.weight().get();
            }
            current = parent;
        }

        before
    }
}

impl<K: PartialOrd, V> RawOSTree<K, V> {
    /// Returns `true` if a new node with key `key` descends left of `at`.
    fn goes_left(&self, key: &K, at: Handle) -> bool {
        match key.partial_cmp(self.node(at).key()) {
            Some(Ordering::Less) => true,
            Some(Ordering::Equal) => self.tie_break == TieBreak::Left,
            Some(Ordering::Greater) | None => false,
        }
    }

    /// Inserts a new node and returns its handle.
    ///
    /// The caller has checked that `key` is comparable with itself.
    pub(crate) fn insert(&mut self, key: K, value: V, weight: Weight) -> Handle {
        let z = self.nodes.alloc(Node::new(key, value, weight));

        let mut parent = Handle::NIL;
        let mut current = self.root;
        let mut left = false;

        // Every node on the descent path gains `z` in its subtree.
        while !current.is_nil() {
            let node = self.node_mut(current);
            node.size += 1;
            node.total_weight += weight.get();

            parent = current;
            left = self.goes_left(self.node(z).key(), current);
            current = if left { self.left(current) } else { self.right(current) };
        }

        let node = self.node_mut(z);
        node.parent = parent;
        node.size = 1;
        node.total_weight = weight.get();

        if parent.is_nil() {
            self.root = z;
        } else if left {
            self.node_mut(parent).left = z;
            self.link_before(parent, z);
        } else {
            self.node_mut(parent).right = z;
            self.link_after(parent, z);
        }

        if self.minimum.is_nil() || (parent == self.minimum && left) {
            self.minimum = z;
        }
        if self.maximum.is_nil() || (parent == self.maximum && !left) {
            self.maximum = z;
        }

        trace!("insert: attached under {parent:?} (left: {left})");
        self.insert_fixup(z);
        z
    }

    /// Links `z` into the chain immediately before `at`.
    fn link_before(&mut self, at: Handle, z: Handle) {
        let prev = self.node(at).prev;
        let node = self.node_mut(z);
        node.prev = prev;
        node.next = at;
        self.node_mut(at).prev = z;
        if !prev.is_nil() {
            self.node_mut(prev).next = z;
        }
    }

    /// Links `z` into the chain immediately after `at`.
    fn link_after(&mut self, at: Handle, z: Handle) {
        let next = self.node(at).next;
        let node = self.node_mut(z);
        node.next = next;
        node.prev = at;
        self.node_mut(at).next = z;
        if !next.is_nil() {
            self.node_mut(next).prev = z;
        }
    }

    /// Returns a node whose key equals `key`, or `Handle::NIL`.
    pub(crate) fn search<Q>(&self, key: &Q) -> Handle
    where
        K: Borrow<Q>,
        Q: ?Sized + PartialOrd,
    {
        let mut current = self.root;

        while !current.is_nil() {
            let node = self.node(current);
            match key.partial_cmp(node.key().borrow()) {
                Some(Ordering::Equal) => return current,
                Some(Ordering::Less) => current = node.left,
                Some(Ordering::Greater) => current = node.right,
                None => return Handle::NIL,
            }
        }

        Handle::NIL
    }
}
