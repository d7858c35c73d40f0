mod arena;
mod handle;
mod node;
mod raw_ostree;
mod weight;

pub(crate) use handle::Handle;
pub use node::Color;
pub(crate) use raw_ostree::RawOSTree;
pub use raw_ostree::TieBreak;
pub(crate) use weight::Weight;
