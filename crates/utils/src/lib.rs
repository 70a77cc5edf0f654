//! Shared utilities for the coalesce workspace
//!
//! Process-level concerns that do not belong in the cache library itself:
//! installing a tracing subscriber and locating configuration directories.

pub mod tracing;
pub mod xdg;

pub use xdg::XdgPaths;
