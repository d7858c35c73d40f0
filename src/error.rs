use thiserror::Error;

/// Errors raised by [`OSTree`](crate::OSTree) operations.
///
/// Every operation that can fail validates its arguments before it touches
/// the tree, so an `Err` always leaves the tree unchanged. Absence (a key that
/// is not present, a rank out of range) is reported with `Option`, never with
/// an error.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum Error {
    /// The key is not comparable with itself, e.g. `f64::NAN`.
    #[error("key is not comparable with itself")]
    IncomparableKey,
    /// The weight is negative, NaN or infinite.
    #[error("weight {0} is not a finite, non-negative number")]
    InvalidWeight(f64),
    /// The node handle was issued by a different tree (or by this tree before
    /// it was cleared).
    #[error("node handle does not belong to this tree")]
    ForeignNode,
    /// The node handle refers to a node that has since been deleted.
    #[error("node handle refers to a deleted node")]
    StaleNode,
}

/// A `Result` defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;
