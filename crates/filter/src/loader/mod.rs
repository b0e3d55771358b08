//! Filesystem filter config loader with hot-reload via `notify` watcher.
//!
//! Scans a directory for `FilterConfig` documents, compiles each one into a
//! [`FilterPlan`](crate::FilterPlan) and keeps the plans keyed by
//! `metadata.id`. A document that fails to compile never replaces a plan
//! that is already installed.

mod core;
mod error;
mod watcher;

#[cfg(test)]
mod tests;

pub use self::core::{compile_file, FilterLoader, LoadedPlan, PlanMap};
pub use self::error::{LoadResult, LoadStatus, LoaderError, Result};
