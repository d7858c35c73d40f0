/// A key, value and weight to be inserted into an [`OSTree`](crate::OSTree).
///
/// An `Outcome` is plain data: it is moved into the tree by
/// [`insert`](crate::OSTree::insert), so the same outcome can never be
/// inserted twice, and it is handed back by
/// [`delete`](crate::OSTree::delete). The weight is checked when the outcome is
/// inserted, not when it is built.
///
/// # Examples
///
/// ```
/// use wabi_ostree::Outcome;
///
/// let outcome = Outcome::new("six", 6).with_weight(0.5);
/// assert_eq!(outcome.key(), &"six");
/// assert_eq!(outcome.weight(), 0.5);
///
/// // Keys double as values, with the default weight of 1.
/// let plain = Outcome::from_key(3);
/// assert_eq!(plain.into_parts(), (3, 3, 1.0));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome<K, V> {
    key: K,
    value: V,
    weight: f64,
}

impl<K, V> Outcome<K, V> {
    /// Creates an outcome with a weight of 1.
    #[must_use]
    pub fn new(key: K, value: V) -> Self {
        Outcome { key, value, weight: 1.0 }
    }

    /// Replaces the weight.
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Splits the outcome into its key, value and weight.
    #[must_use]
    pub fn into_parts(self) -> (K, V, f64) {
        (self.key, self.value, self.weight)
    }
}

impl<K: Clone> Outcome<K, K> {
    /// Creates an outcome whose value is a copy of its key, with a weight of 1.
    #[must_use]
    pub fn from_key(key: K) -> Self {
        Outcome::new(key.clone(), key)
    }
}

impl<K, V> From<(K, V)> for Outcome<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Outcome::new(key, value)
    }
}

impl<K, V> From<(K, V, f64)> for Outcome<K, V> {
    fn from((key, value, weight): (K, V, f64)) -> Self {
        Outcome::new(key, value).with_weight(weight)
    }
}
