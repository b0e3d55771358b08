//! Compiled filter operators.
//!
//! A [`FilterOperator`] is one node of a compiled rule tree: either a leaf
//! that compares a property of its domain entity against an [`Operand`], a
//! presence check, or a bool node over child operators. Operators hold no
//! mutable state and are pure functions of the three property maps they are
//! evaluated against.

mod compare;
mod compile;

pub use compare::{float_eq, FLOAT_EPSILON};
pub use compile::compile;

use std::borrow::Cow;
use std::cmp::Ordering;

use recflow_core::{CoercionError, Properties, Value, ValueType};

use crate::error::{FilterError, Result};
use crate::schema::{Domain, OperatorKind};

// ── Operands ────────────────────────────────────────────────────────

/// Right-hand side of a leaf comparison, decided once at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Constant, already coerced to the operator's operand type.
    Literal(Value),
    /// `user.<key>` / `item.<key>`: read from the named scope per evaluation.
    Reference { scope: Domain, key: String },
}

impl Operand {
    /// Classify a configured value. Strings prefixed `user.` or `item.` with
    /// a non-empty key are references; everything else is a literal.
    pub fn parse(raw: &Value) -> Self {
        if let Value::String(s) = raw {
            for (prefix, scope) in [("user.", Domain::User), ("item.", Domain::Item)] {
                if let Some(key) = s.strip_prefix(prefix).filter(|k| !k.is_empty()) {
                    return Operand::Reference {
                        scope,
                        key: key.to_string(),
                    };
                }
            }
        }
        Operand::Literal(raw.clone())
    }

    /// Resolve against the evaluation scopes. An absent or explicitly null
    /// reference resolves to the zero value of `ty`.
    fn resolve<'a>(
        &'a self,
        ty: ValueType,
        user: &'a Properties,
        item: &'a Properties,
    ) -> Cow<'a, Value> {
        match self {
            Operand::Literal(value) => Cow::Borrowed(value),
            Operand::Reference { scope, key } => {
                let source = match scope {
                    Domain::User => user,
                    Domain::Item => item,
                };
                match source.get(key) {
                    None | Some(Value::Null) => Cow::Owned(Value::zero_of(ty)),
                    Some(value) => Cow::Borrowed(value),
                }
            }
        }
    }
}

// ── Operator tree ───────────────────────────────────────────────────

/// A comparison leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub property: String,
    pub domain: Domain,
    /// Declared type from configuration.
    pub ty: ValueType,
    /// Type the operand is coerced to (`[]T` for `in` / `not_in`).
    pub operand_ty: ValueType,
    pub operand: Operand,
}

/// An `is_null` / `is_not_null` check.
#[derive(Debug, Clone, PartialEq)]
pub struct Presence {
    pub property: String,
    pub domain: Domain,
}

/// Children of a `bool` filter, evaluated in configuration order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoolNode {
    pub domain: Domain,
    pub children: Vec<FilterOperator>,
}

/// One compiled filter.
///
/// **Threshold semantics:** [`Greater`](Self::Greater) and
/// [`Less`](Self::Less) come from the `greater` / `less` literals and are
/// inclusive (`>=` / `<=`). [`GreaterStrict`](Self::GreaterStrict) and
/// [`LessStrict`](Self::LessStrict) come from `greaterThan` / `lessThan` and
/// are strict. Configurations written against the existing surface rely on
/// this exact mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOperator {
    Equal(Leaf),
    NotEqual(Leaf),
    In(Leaf),
    NotIn(Leaf),
    Contains(Leaf),
    NotContains(Leaf),
    Greater(Leaf),
    GreaterStrict(Leaf),
    Less(Leaf),
    LessStrict(Leaf),
    IsNull(Presence),
    IsNotNull(Presence),
    BoolAnd(BoolNode),
    BoolOr(BoolNode),
}

impl FilterOperator {
    /// Entity whose properties this operator's target lookup reads.
    pub fn domain(&self) -> Domain {
        match self {
            Self::IsNull(p) | Self::IsNotNull(p) => p.domain,
            Self::BoolAnd(node) | Self::BoolOr(node) => node.domain,
            Self::Equal(leaf)
            | Self::NotEqual(leaf)
            | Self::In(leaf)
            | Self::NotIn(leaf)
            | Self::Contains(leaf)
            | Self::NotContains(leaf)
            | Self::Greater(leaf)
            | Self::GreaterStrict(leaf)
            | Self::Less(leaf)
            | Self::LessStrict(leaf) => leaf.domain,
        }
    }

    pub fn kind(&self) -> OperatorKind {
        match self {
            Self::Equal(_) => OperatorKind::Equal,
            Self::NotEqual(_) => OperatorKind::NotEqual,
            Self::In(_) => OperatorKind::In,
            Self::NotIn(_) => OperatorKind::NotIn,
            Self::Contains(_) => OperatorKind::Contains,
            Self::NotContains(_) => OperatorKind::NotContains,
            Self::Greater(_) => OperatorKind::Greater,
            Self::GreaterStrict(_) => OperatorKind::GreaterStrict,
            Self::Less(_) => OperatorKind::Less,
            Self::LessStrict(_) => OperatorKind::LessStrict,
            Self::IsNull(_) => OperatorKind::IsNull,
            Self::IsNotNull(_) => OperatorKind::IsNotNull,
            Self::BoolAnd(_) | Self::BoolOr(_) => OperatorKind::Bool,
        }
    }

    /// Target property name; `None` for bool nodes.
    pub fn property(&self) -> Option<&str> {
        match self {
            Self::IsNull(p) | Self::IsNotNull(p) => Some(&p.property),
            Self::BoolAnd(_) | Self::BoolOr(_) => None,
            Self::Equal(leaf)
            | Self::NotEqual(leaf)
            | Self::In(leaf)
            | Self::NotIn(leaf)
            | Self::Contains(leaf)
            | Self::NotContains(leaf)
            | Self::Greater(leaf)
            | Self::GreaterStrict(leaf)
            | Self::Less(leaf)
            | Self::LessStrict(leaf) => Some(&leaf.property),
        }
    }

    /// Scope of this operator's own domain.
    pub(crate) fn scope<'a>(&self, user: &'a Properties, item: &'a Properties) -> &'a Properties {
        match self.domain() {
            Domain::User => user,
            Domain::Item => item,
        }
    }

    /// Evaluate against `target` (the domain entity's properties) with
    /// `user` / `item` available for operand references.
    ///
    /// An absent target property yields `Ok(false)` for every leaf except
    /// `IsNull`, which yields `Ok(true)`. A present property that cannot be
    /// coerced to the declared type is an error.
    pub fn evaluate(
        &self,
        target: &Properties,
        user: &Properties,
        item: &Properties,
    ) -> Result<bool> {
        match self {
            Self::IsNull(p) => Ok(!target.contains_key(&p.property)),
            Self::IsNotNull(p) => Ok(target.contains_key(&p.property)),
            Self::BoolAnd(node) => {
                for child in &node.children {
                    if !child.evaluate(child.scope(user, item), user, item)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::BoolOr(node) => {
                for child in &node.children {
                    if child.evaluate(child.scope(user, item), user, item)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Equal(leaf)
            | Self::NotEqual(leaf)
            | Self::In(leaf)
            | Self::NotIn(leaf)
            | Self::Contains(leaf)
            | Self::NotContains(leaf)
            | Self::Greater(leaf)
            | Self::GreaterStrict(leaf)
            | Self::Less(leaf)
            | Self::LessStrict(leaf) => {
                // Explicit nulls carry no comparable value.
                let actual = match target.get(&leaf.property) {
                    None | Some(Value::Null) => return Ok(false),
                    Some(value) => value,
                };
                let expected = leaf.operand.resolve(leaf.operand_ty, user, item);
                self.compare_leaf(leaf, actual, &expected)
                    .map_err(|source| FilterError::Coercion {
                        property: leaf.property.clone(),
                        source,
                    })
            }
        }
    }

    fn compare_leaf(
        &self,
        leaf: &Leaf,
        actual: &Value,
        expected: &Value,
    ) -> std::result::Result<bool, CoercionError> {
        let ty = leaf.ty;
        match self {
            Self::Equal(_) => compare::equals(ty, actual, expected),
            Self::NotEqual(_) => compare::equals(ty, actual, expected).map(|eq| !eq),
            Self::In(_) => compare::member(ty, actual, &expected.to_list()?),
            Self::NotIn(_) => compare::member(ty, actual, &expected.to_list()?).map(|m| !m),
            Self::Contains(_) => compare::intersects(ty, &actual.to_list()?, &expected.to_list()?),
            Self::NotContains(_) => {
                compare::intersects(ty, &actual.to_list()?, &expected.to_list()?).map(|m| !m)
            }
            Self::Greater(_) => compare::ordering(ty, actual, expected)
                .map(|ord| matches!(ord, Some(Ordering::Greater | Ordering::Equal))),
            Self::GreaterStrict(_) => compare::ordering(ty, actual, expected)
                .map(|ord| ord == Some(Ordering::Greater)),
            Self::Less(_) => compare::ordering(ty, actual, expected)
                .map(|ord| matches!(ord, Some(Ordering::Less | Ordering::Equal))),
            Self::LessStrict(_) => {
                compare::ordering(ty, actual, expected).map(|ord| ord == Some(Ordering::Less))
            }
            Self::IsNull(_) | Self::IsNotNull(_) | Self::BoolAnd(_) | Self::BoolOr(_) => {
                unreachable!("compare_leaf called on a non-leaf operator")
            }
        }
    }
}
