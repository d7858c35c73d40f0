/// A one-based rank into the key order of an [`OSTree`](crate::OSTree).
///
/// `Rank(1)` is the minimum and `Rank(tree.count())` the maximum.
///
/// # Examples
///
/// ```
/// use wabi_ostree::{OSTree, Rank};
///
/// let mut tree = OSTree::new();
/// tree.add("b", 20, 1.0).unwrap();
/// tree.add("a", 10, 1.0).unwrap();
///
/// assert_eq!(tree[Rank(1)], 10);
/// assert_eq!(tree[Rank(2)], 20);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Rank(pub usize);
