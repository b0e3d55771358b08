//! Versioned filter configuration document.

use serde::{Deserialize, Serialize};

use super::FilterParamConfig;

/// The only `kind` a filter document may declare.
pub const FILTER_KIND: &str = "FilterConfig";

/// Metadata shared by all filter documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FilterMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

pub(crate) fn default_true() -> bool {
    true
}

/// A filter configuration file: header plus the ordered rule list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: FilterMetadata,
    #[serde(default)]
    pub filters: Vec<FilterParamConfig>,
}

impl FilterDocument {
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
