use thiserror::Error;

use crate::value::Value;

/// A present value could not be converted to the requested type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("cannot convert {found} to {target}")]
    UnsupportedType { target: &'static str, found: &'static str },

    #[error("cannot parse {raw:?} as {target}")]
    Unparsable { target: &'static str, raw: String },
}

impl CoercionError {
    pub(crate) fn unsupported(target: &'static str, found: &Value) -> Self {
        Self::UnsupportedType {
            target,
            found: found.type_name(),
        }
    }

    pub(crate) fn unparsable(target: &'static str, raw: &str) -> Self {
        Self::Unparsable {
            target,
            raw: raw.to_string(),
        }
    }
}

/// Typed property lookup failure.
///
/// `NotFound` and `Coercion` are kept apart so callers can tell a missing
/// feature from a feature with the wrong shape.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    #[error("property not found: {0}")]
    NotFound(String),

    #[error("property '{key}': {source}")]
    Coercion {
        key: String,
        #[source]
        source: CoercionError,
    },
}

impl PropertyError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Contract violations on an [`AsyncLoadCoordinator`](crate::AsyncLoadCoordinator).
///
/// These abort the loading phase of the owning request only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("pending load count underflow: {pending} pending, {requested} completed")]
    Underflow { pending: usize, requested: usize },

    #[error("loading phase already aborted")]
    Aborted,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguishable() {
        let missing = PropertyError::NotFound("price".into());
        let wrong = PropertyError::Coercion {
            key: "price".into(),
            source: CoercionError::unparsable("float", "cheap"),
        };
        assert!(missing.is_not_found());
        assert!(!wrong.is_not_found());
        assert!(wrong.to_string().contains("cheap"));
    }

    #[test]
    fn underflow_message() {
        let err = LoadError::Underflow {
            pending: 1,
            requested: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("underflow"));
        assert!(msg.contains('2'));
    }

    #[test]
    fn core_error_from_load() {
        let err: CoreError = LoadError::Aborted.into();
        assert!(matches!(err, CoreError::Load(LoadError::Aborted)));
    }
}
