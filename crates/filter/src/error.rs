//! Compile-time and evaluation-time filter errors.

use recflow_core::CoercionError;

/// A filter configuration could not be compiled into a plan.
///
/// Raised when the configuration is loaded, never during evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("filter '{name}': unknown operator kind '{operator}'")]
    UnknownOperator { name: String, operator: String },

    #[error("filter '{name}': {reason}")]
    UnknownType { name: String, reason: String },

    #[error("bool filter: unknown combinator '{0}' (expected 'and' or 'or')")]
    UnknownCombinator(String),

    #[error("filter '{name}': missing required field '{field}'")]
    MissingField { name: String, field: &'static str },

    #[error("filter '{name}': operator '{operator}' does not support type '{value_type}'")]
    UnsupportedType {
        name: String,
        operator: &'static str,
        value_type: String,
    },

    #[error("filter '{name}': invalid literal: {source}")]
    InvalidLiteral {
        name: String,
        #[source]
        source: CoercionError,
    },

    #[error("bool filter '{0}' has no child filters")]
    EmptyCombinator(String),
}

/// A filter could not be evaluated against the given properties.
///
/// Callers treat this as "reject the item" rather than admitting it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("filter on '{property}': {source}")]
    Coercion {
        property: String,
        #[source]
        source: CoercionError,
    },
}

/// Result alias for filter evaluation.
pub type Result<T> = std::result::Result<T, FilterError>;
