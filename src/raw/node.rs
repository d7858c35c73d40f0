use super::handle::Handle;
use super::weight::Weight;

/// Node color for red-black balancing.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Color {
    Red,
    Black,
}

// One slot of the tree arena. Every real node carries an entry; the sentinel
// (slot 0) does not.
#[derive(Clone)]
pub(crate) struct Node<K, V> {
    entry: Option<(K, V)>,
    weight: Weight,
    pub(crate) color: Color,
    pub(crate) left: Handle,
    pub(crate) right: Handle,
    pub(crate) parent: Handle,
    // In-order successor and predecessor; `Handle::NIL` past either end.
    pub(crate) next: Handle,
    pub(crate) prev: Handle,
    // Number of real nodes in the subtree rooted here, including this one.
    pub(crate) size: usize,
    // Sum of weights over the subtree rooted here, including this one.
    pub(crate) total_weight: f64,
}

impl<K, V> Node<K, V> {
    /// Creates the sentinel: black, empty statistics, every link to itself.
    pub(crate) const fn sentinel() -> Self {
        Self {
            entry: None,
            weight: Weight::ZERO,
            color: Color::Black,
            left: Handle::NIL,
            right: Handle::NIL,
            parent: Handle::NIL,
            next: Handle::NIL,
            prev: Handle::NIL,
            size: 0,
            total_weight: 0.0,
        }
    }

    /// Creates a detached red node. Statistics are set when it is attached.
    pub(crate) fn new(key: K, value: V, weight: Weight) -> Self {
        Self {
            entry: Some((key, value)),
            weight,
            color: Color::Red,
            left: Handle::NIL,
            right: Handle::NIL,
            parent: Handle::NIL,
            next: Handle::NIL,
            prev: Handle::NIL,
            size: 0,
            total_weight: weight.get(),
        }
    }

    pub(crate) fn is_sentinel(&self) -> bool {
        self.entry.is_none()
    }

    #[inline]
    pub(crate) fn key(&self) -> &K {
        &self.entry.as_ref().expect("sentinel has no key").0
    }

    #[inline]
    pub(crate) fn value(&self) -> &V {
        &self.entry.as_ref().expect("sentinel has no value").1
    }

    #[inline]
    pub(crate) fn value_mut(&mut self) -> &mut V {
        &mut self.entry.as_mut().expect("sentinel has no value").1
    }

    #[inline]
    pub(crate) fn weight(&self) -> Weight {
        self.weight
    }

    pub(crate) fn set_weight(&mut self, weight: Weight) {
        self.weight = weight;
    }

    /// Consumes a real node, returning its key, value and weight.
    pub(crate) fn into_parts(self) -> (K, V, Weight) {
        let (key, value) = self.entry.expect("sentinel has no entry");
        (key, value, self.weight)
    }
}
