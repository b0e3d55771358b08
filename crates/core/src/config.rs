use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    profiled_env_opt(profile, key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

/// Process-level settings for the request runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    pub feature: FeatureRuntimeConfig,
    pub filter: FilterRuntimeConfig,
}

impl RuntimeConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `RECFLOW_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("RECFLOW_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            feature: FeatureRuntimeConfig::from_env_profiled(p),
            filter: FilterRuntimeConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  feature:  timeout_ms={}", self.feature.timeout_ms);
        tracing::info!(
            "  filter:   dir={}, hot_reload={}",
            self.filter.config_dir.display(),
            self.filter.hot_reload
        );
    }
}

// ── Feature loading ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRuntimeConfig {
    /// Default bound on waiting for async feature loads.
    pub timeout_ms: u64,
}

impl FeatureRuntimeConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            timeout_ms: profiled_env_u64(p, "RECFLOW_FEATURE_TIMEOUT_MS", 100),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for FeatureRuntimeConfig {
    fn default() -> Self {
        Self { timeout_ms: 100 }
    }
}

// ── Filters ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRuntimeConfig {
    /// Directory scanned for filter config documents.
    pub config_dir: PathBuf,
    pub hot_reload: bool,
}

impl FilterRuntimeConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            config_dir: PathBuf::from(profiled_env_or(p, "RECFLOW_FILTER_DIR", "config/filters")),
            hot_reload: profiled_env_bool(p, "RECFLOW_FILTER_HOT_RELOAD", false),
        }
    }
}

impl Default for FilterRuntimeConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("config/filters"),
            hot_reload: false,
        }
    }
}
