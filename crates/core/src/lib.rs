//! Per-request entity state for the recommendation runtime.
//!
//! - [`Value`]: dynamically typed property values with best-effort coercion
//! - [`PropertyStore`]: lock-protected properties plus cache namespaces
//! - [`AsyncLoadCoordinator`]: counting completion barrier for feature loads
//! - [`User`] / [`Item`]: the entities feature fetchers write into

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod properties;
pub mod value;

pub use config::RuntimeConfig;
pub use coordinator::{AsyncLoadCoordinator, LoadGuard, LoadPhase, WaitOutcome};
pub use entity::*;
pub use error::*;
pub use properties::PropertyStore;
pub use value::{Properties, ScalarType, Value, ValueType};
