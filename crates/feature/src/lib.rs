//! Feature loading for request entities.
//!
//! A [`FeatureLoader`] fans a request's user (or candidate batch) out to
//! every registered [`FeatureFetcher`], waits on the entity's
//! [`AsyncLoadCoordinator`](recflow_core::AsyncLoadCoordinator) with a
//! deadline and promotes the configured cache namespaces into properties.

pub mod config;
pub mod fetcher;
pub mod loader;

pub use config::FeatureLoadConfig;
pub use fetcher::{FeatureFetcher, FetchError, RequestContext};
pub use loader::{FeatureLoader, LoadReport};
