//! An order-statistic red-black tree with weighted selection.
//!
//! This crate provides [`OSTree`], a balanced binary search tree whose nodes
//! carry a key, a value and a non-negative weight. Every node also tracks the
//! size and total weight of its subtree, which enables O(log n) queries that
//! plain ordered maps cannot answer:
//!
//! - [`rank_select`](OSTree::rank_select) - Get the node at a one-based sorted position
//! - [`weight_select`](OSTree::weight_select) - Get the node whose slice of the cumulative weight contains a value
//! - [`sample`](OSTree::sample) - Draw a node with probability proportional to its weight
//! - Indexing by [`Rank`] - e.g., `tree[Rank(1)]` for the value of the minimum
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use wabi_ostree::{OSTree, Rank};
//!
//! let mut weather = OSTree::new();
//! let sunny = weather.add("sunny", 0, 6.0).unwrap();
//! weather.add("cloudy", 1, 3.0).unwrap();
//! weather.add("rainy", 2, 1.0).unwrap();
//!
//! // Nodes are kept in key order.
//! assert_eq!(weather[Rank(1)], 1); // "cloudy"
//! assert_eq!(weather.total_weight(), 10.0);
//!
//! // The cumulative weight is split into (0, 3], (3, 4] and (4, 10].
//! assert_eq!(*weather.weight_select(3.5).unwrap().key(), "rainy");
//!
//! // Weights can change in place.
//! weather.set_weight(sunny, 0.0).unwrap();
//! let mut rng = StdRng::seed_from_u64(42);
//! assert_ne!(*weather.sample(&mut rng).unwrap().key(), "sunny");
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Checked handles** - [`NodeRef`]s from another tree or to a deleted node are rejected
//! - **O(1) neighbors** - Minimum, maximum, successor and predecessor through an in-order chain
//! - **Duplicate keys** - Placed deterministically according to [`TieBreak`]
//!
//! # Implementation
//!
//! Nodes live in an arena and link to each other through indices, with slot 0
//! holding the tree's own black sentinel. Each arena slot carries a generation
//! counter, which is how stale handles are detected after a slot is reused.

#![cfg_attr(not(test), no_std)]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod error;
mod order_statistic;
mod raw;

pub mod ostree;

pub use error::{Error, Result};
pub use order_statistic::Rank;
pub use ostree::{NodeRef, NodeView, OSTree, Outcome};
pub use raw::{Color, TieBreak};
