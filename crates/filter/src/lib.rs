//! Rule-based admission filters for recommendation candidates.
//!
//! Filter descriptors (see [`schema`]) are compiled once into a
//! [`FilterPlan`], which is then evaluated for every (user, item) pair of a
//! request. Evaluation is pure and lock-free; errors reject the item.

pub mod error;
pub mod loader;
pub mod operator;
pub mod plan;
pub mod schema;

pub use error::{CompileError, FilterError, Result};
pub use loader::{FilterLoader, LoadResult, LoadStatus, LoaderError};
pub use operator::{FilterOperator, Operand};
pub use plan::FilterPlan;
pub use schema::{Domain, FilterDocument, FilterParamConfig, OperatorKind};
