//! Rule descriptor as written in filter configuration files.

use std::fmt;

use serde::{Deserialize, Serialize};

use recflow_core::Value;

/// Which entity a filter's property lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    User,
    Item,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::User => write!(f, "user"),
            Domain::Item => write!(f, "item"),
        }
    }
}

/// One filter rule. Field names are PascalCase for compatibility with
/// existing configuration files; lower-case spellings are accepted too.
///
/// `Operator` and `Type` stay raw strings here so that an unknown kind is
/// reported by [`FilterPlan::compile`](crate::FilterPlan::compile) with the
/// filter's name attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterParamConfig {
    #[serde(rename = "Name", alias = "name", default)]
    pub name: String,

    /// Omitted on top-level filters means `item`; bool children inherit
    /// their parent's domain.
    #[serde(rename = "Domain", alias = "domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,

    #[serde(rename = "Operator", alias = "operator")]
    pub operator: String,

    /// Value type for leaf filters, `and` / `or` for bool filters.
    #[serde(rename = "Type", alias = "type", default)]
    pub value_type: String,

    /// Literal operand, or a `user.<key>` / `item.<key>` reference.
    #[serde(rename = "Value", alias = "value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(rename = "Configs", alias = "configs", default, skip_serializing_if = "Vec::is_empty")]
    pub configs: Vec<FilterParamConfig>,
}

impl FilterParamConfig {
    /// Leaf rule builder, mostly for tests and programmatic plans.
    pub fn leaf(
        domain: Domain,
        name: impl Into<String>,
        operator: impl Into<String>,
        value_type: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            domain: Some(domain),
            operator: operator.into(),
            value_type: value_type.into(),
            value: Some(value.into()),
            configs: Vec::new(),
        }
    }

    /// Presence rule (`is_null` / `is_not_null`).
    pub fn presence(domain: Domain, name: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: Some(domain),
            operator: operator.into(),
            ..Self::default()
        }
    }

    /// Bool rule combining `configs` with `and` / `or`.
    pub fn combine(
        domain: Domain,
        combinator: impl Into<String>,
        configs: Vec<FilterParamConfig>,
    ) -> Self {
        Self {
            name: String::new(),
            domain: Some(domain),
            operator: "bool".to_string(),
            value_type: combinator.into(),
            value: None,
            configs,
        }
    }
}
