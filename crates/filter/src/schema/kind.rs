//! Operator literals accepted in the `Operator` field.

use std::fmt;
use std::str::FromStr;

/// The thirteen operator kinds of the configuration surface.
///
/// **Threshold naming:** `greater` / `less` are *inclusive* (`>=` / `<=`)
/// while `greaterThan` / `lessThan` are *strict* (`>` / `<`). Existing
/// configurations depend on this, so do not swap them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Equal,
    NotEqual,
    In,
    NotIn,
    Contains,
    NotContains,
    /// `greater`: `>=`
    Greater,
    /// `greaterThan`: `>`
    GreaterStrict,
    /// `less`: `<=`
    Less,
    /// `lessThan`: `<`
    LessStrict,
    IsNull,
    IsNotNull,
    Bool,
}

impl OperatorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            OperatorKind::Equal => "equal",
            OperatorKind::NotEqual => "not_equal",
            OperatorKind::In => "in",
            OperatorKind::NotIn => "not_in",
            OperatorKind::Contains => "contains",
            OperatorKind::NotContains => "not_contains",
            OperatorKind::Greater => "greater",
            OperatorKind::GreaterStrict => "greaterThan",
            OperatorKind::Less => "less",
            OperatorKind::LessStrict => "lessThan",
            OperatorKind::IsNull => "is_null",
            OperatorKind::IsNotNull => "is_not_null",
            OperatorKind::Bool => "bool",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatorKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "equal" => Ok(OperatorKind::Equal),
            "not_equal" => Ok(OperatorKind::NotEqual),
            "in" => Ok(OperatorKind::In),
            "not_in" => Ok(OperatorKind::NotIn),
            "contains" => Ok(OperatorKind::Contains),
            "not_contains" => Ok(OperatorKind::NotContains),
            "greater" => Ok(OperatorKind::Greater),
            "greaterThan" => Ok(OperatorKind::GreaterStrict),
            "less" => Ok(OperatorKind::Less),
            "lessThan" => Ok(OperatorKind::LessStrict),
            "is_null" => Ok(OperatorKind::IsNull),
            "is_not_null" => Ok(OperatorKind::IsNotNull),
            "bool" => Ok(OperatorKind::Bool),
            other => Err(format!("unknown operator kind: '{}'", other)),
        }
    }
}

/// `Type` of a `bool` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    And,
    Or,
}

impl FromStr for Combinator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(Combinator::And),
            "or" => Ok(Combinator::Or),
            other => Err(other.to_string()),
        }
    }
}
