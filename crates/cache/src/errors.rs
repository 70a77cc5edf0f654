//! Error handling for the cache layer
//!
//! Errors fall into two families. Recompute failures belong to the caller and
//! are always surfaced. Storage failures belong to the provider and are
//! absorbed by `CacheService`, which degrades to direct recomputation.

mod conversions;
mod display;
mod recovery;
mod types;

pub use types::*;
