//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod sync;

pub use circular::MAX_CONSTRUCTION_DEPTH;
pub(crate) use circular::ConstructionStack;
