//! Feature load settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use recflow_core::config::FeatureRuntimeConfig;

fn default_timeout_ms() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

/// How a [`FeatureLoader`](crate::FeatureLoader) runs its fetchers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureLoadConfig {
    /// Deadline for the whole fetch phase.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Cache namespaces promoted into properties after the wait, in order.
    #[serde(default)]
    pub promote_namespaces: Vec<String>,

    /// Spawn fetchers concurrently; when false they are awaited one by one.
    #[serde(default = "default_true")]
    pub async_load: bool,
}

impl Default for FeatureLoadConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            promote_namespaces: Vec::new(),
            async_load: true,
        }
    }
}

impl FeatureLoadConfig {
    /// Defaults with the timeout taken from the process runtime config.
    pub fn from_runtime(runtime: &FeatureRuntimeConfig) -> Self {
        Self {
            timeout_ms: runtime.timeout_ms,
            ..Self::default()
        }
    }

    pub fn with_promoted<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.promote_namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config: FeatureLoadConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, FeatureLoadConfig::default());
        assert_eq!(config.timeout(), Duration::from_millis(100));
        assert!(config.async_load);
    }

    #[test]
    fn from_runtime_copies_timeout() {
        let runtime = FeatureRuntimeConfig { timeout_ms: 250 };
        let config = FeatureLoadConfig::from_runtime(&runtime).with_promoted(["profile"]);
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(config.promote_namespaces, vec!["profile".to_string()]);
    }
}
