//! Entity collections and batched resolution.

mod batch;
pub mod collection;
pub mod summary;

pub use collection::{EntityCollection, Item, Projected};
pub use summary::CollectionSummary;
