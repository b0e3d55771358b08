//! Dynamically typed property values and best-effort coercion.
//!
//! Feature producers write whatever shape their upstream store returns, so
//! property maps hold a closed [`Value`] enum. Consumers never match on the
//! variant directly; they ask for the type they need through the `to_*`
//! coercions, which widen numbers, parse strings and reject everything else
//! with a typed [`CoercionError`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoercionError;

/// Property map shared by users, items and cache namespaces.
pub type Properties = HashMap<String, Value>;

/// A dynamically typed property value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

/// Target type a value is coerced to before comparison.
///
/// Parsed from the `Type` field of filter configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValueType {
    String,
    Int,
    Float,
    Bool,
    /// List whose elements compare as the inner scalar type.
    List(ScalarType),
}

/// Element type of a [`ValueType::List`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    String,
    Int,
    Float,
}

impl Value {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Human-readable variant name, used in coercion errors.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Textual form of a scalar value.
    pub fn to_text(&self) -> Result<String, CoercionError> {
        match self {
            Self::String(s) => Ok(s.clone()),
            Self::Int(v) => Ok(v.to_string()),
            Self::Float(v) => Ok(v.to_string()),
            Self::Bool(v) => Ok(v.to_string()),
            other => Err(CoercionError::unsupported("string", other)),
        }
    }

    /// Integer form; floats truncate toward zero, strings are parsed.
    pub fn to_int(&self) -> Result<i64, CoercionError> {
        match self {
            Self::Int(v) => Ok(*v),
            Self::Float(v) => Ok(v.trunc() as i64),
            Self::String(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .or_else(|_| trimmed.parse::<f64>().map(|f| f.trunc() as i64))
                    .map_err(|_| CoercionError::unparsable("int", s))
            }
            other => Err(CoercionError::unsupported("int", other)),
        }
    }

    /// Floating-point form; integers widen, strings are parsed.
    pub fn to_float(&self) -> Result<f64, CoercionError> {
        match self {
            Self::Float(v) => Ok(*v),
            Self::Int(v) => Ok(*v as f64),
            Self::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| CoercionError::unparsable("float", s)),
            other => Err(CoercionError::unsupported("float", other)),
        }
    }

    pub fn to_bool(&self) -> Result<bool, CoercionError> {
        match self {
            Self::Bool(v) => Ok(*v),
            Self::Int(v) => Ok(*v != 0),
            Self::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(CoercionError::unparsable("bool", s)),
            },
            other => Err(CoercionError::unsupported("bool", other)),
        }
    }

    /// List form. Strings are split on commas (`"a, b"` → `["a", "b"]`)
    /// and other scalars become a one-element list.
    pub fn to_list(&self) -> Result<Vec<Value>, CoercionError> {
        match self {
            Self::List(items) => Ok(items.clone()),
            Self::String(s) => Ok(s
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| Self::String(part.to_string()))
                .collect()),
            Self::Int(_) | Self::Float(_) | Self::Bool(_) => Ok(vec![self.clone()]),
            other => Err(CoercionError::unsupported("list", other)),
        }
    }

    /// The "unset" value for a type: what an absent reference resolves to.
    #[must_use]
    pub fn zero_of(ty: ValueType) -> Self {
        match ty {
            ValueType::String => Self::String(String::new()),
            ValueType::Int => Self::Int(0),
            ValueType::Float => Self::Float(0.0),
            ValueType::Bool => Self::Bool(false),
            ValueType::List(_) => Self::List(Vec::new()),
        }
    }

    /// Coerce into the canonical variant for `ty`.
    pub fn coerce(&self, ty: ValueType) -> Result<Self, CoercionError> {
        match ty {
            ValueType::String => self.to_text().map(Self::String),
            ValueType::Int => self.to_int().map(Self::Int),
            ValueType::Float => self.to_float().map(Self::Float),
            ValueType::Bool => self.to_bool().map(Self::Bool),
            ValueType::List(elem) => self
                .to_list()?
                .iter()
                .map(|v| v.coerce(elem.into()))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
        }
    }
}

impl ValueType {
    /// Scalar type used when comparing single elements of this type.
    #[must_use]
    pub const fn element(self) -> Self {
        match self {
            Self::List(ScalarType::String) => Self::String,
            Self::List(ScalarType::Int) => Self::Int,
            Self::List(ScalarType::Float) => Self::Float,
            other => other,
        }
    }

    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    pub const fn is_list(self) -> bool {
        matches!(self, Self::List(_))
    }
}

impl From<ScalarType> for ValueType {
    fn from(s: ScalarType) -> Self {
        match s {
            ScalarType::String => Self::String,
            ScalarType::Int => Self::Int,
            ScalarType::Float => Self::Float,
        }
    }
}

impl std::str::FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "string" => Ok(Self::String),
            "int" | "int64" | "integer" => Ok(Self::Int),
            "float" | "float64" | "double" => Ok(Self::Float),
            "bool" | "boolean" => Ok(Self::Bool),
            "[]string" | "list<string>" => Ok(Self::List(ScalarType::String)),
            "[]int" | "[]int64" | "list<int>" => Ok(Self::List(ScalarType::Int)),
            "[]float" | "[]float64" | "list<float>" => Ok(Self::List(ScalarType::Float)),
            other => Err(format!("unknown value type: '{other}'")),
        }
    }
}

impl TryFrom<String> for ValueType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ValueType> for String {
    fn from(ty: ValueType) -> Self {
        ty.to_string()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Bool => write!(f, "bool"),
            Self::List(ScalarType::String) => write!(f, "[]string"),
            Self::List(ScalarType::Int) => write!(f, "[]int"),
            Self::List(ScalarType::Float) => write!(f, "[]float"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => write!(f, "map[{}]", map.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(v: HashMap<String, Value>) -> Self {
        Self::Map(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}
