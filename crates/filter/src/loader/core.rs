//! Core [`FilterLoader`]: filesystem-backed plan loading with optional hot-reload.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use recflow_core::config::FilterRuntimeConfig;

use crate::plan::FilterPlan;
use crate::schema::{FilterDocument, FilterMetadata, FILTER_KIND};

use super::error::{LoadResult, LoadStatus, LoaderError, Result};
use super::watcher::handle_fs_event;

/// Shared map of installed plans keyed by `metadata.id`.
pub type PlanMap = Arc<RwLock<HashMap<String, LoadedPlan>>>;

/// A compiled document together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedPlan {
    pub metadata: FilterMetadata,
    pub path: PathBuf,
    pub plan: Arc<FilterPlan>,
}

/// Filesystem-backed filter plan loader.
///
/// Scans a directory (recursively) for `*.yml`, `*.yaml` and `*.json`
/// files holding a `FilterConfig` document and compiles each into a
/// [`FilterPlan`].
pub struct FilterLoader {
    config_dir: PathBuf,
    plans: PlanMap,
    /// Active filesystem watcher (held to keep it alive).
    _watcher: Option<RecommendedWatcher>,
}

impl FilterLoader {
    /// Create a loader for `config_dir`, creating the directory if missing.
    pub fn new(config_dir: PathBuf) -> Self {
        if !config_dir.exists() {
            if let Err(e) = fs::create_dir_all(&config_dir) {
                warn!(path = %config_dir.display(), error = %e, "failed to create filter config directory");
            }
        }
        Self {
            config_dir,
            plans: Arc::new(RwLock::new(HashMap::new())),
            _watcher: None,
        }
    }

    /// Build a loader from runtime config: load everything once, then
    /// start watching if hot reload is enabled.
    pub fn from_config(config: &FilterRuntimeConfig) -> Result<Self> {
        let mut loader = Self::new(config.config_dir.clone());
        let results = loader.load_all()?;
        let failed = results
            .iter()
            .filter(|r| matches!(r.status, LoadStatus::Failed { .. }))
            .count();
        info!(
            path = %loader.config_dir.display(),
            files = results.len(),
            failed,
            "loaded filter configs"
        );
        if config.hot_reload {
            loader.watch()?;
        }
        Ok(loader)
    }

    /// Recursively scan the config directory and install every document.
    ///
    /// Per-file errors are reported in the results and do not abort the scan.
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        self.scan_dir_recursive(&self.config_dir, &mut results)?;
        Ok(results)
    }

    fn scan_dir_recursive(&self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        // Sorted so duplicate ids resolve the same way on every scan.
        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        paths.sort();

        for path in paths {
            if is_dotfile(&path) {
                if path.is_file() {
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Skipped {
                            reason: "dotfile".to_string(),
                        },
                    });
                }
                continue;
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            if !is_config_file(&path) {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML or JSON file".to_string(),
                    },
                });
                continue;
            }

            let status = match apply_file(&self.plans, &path) {
                Ok(Applied::Installed(plan_id)) => LoadStatus::Loaded { plan_id },
                Ok(Applied::Disabled(plan_id)) => LoadStatus::Skipped {
                    reason: format!("filter config '{}' is disabled", plan_id),
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load filter config");
                    LoadStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            results.push(LoadResult { path, status });
        }

        Ok(())
    }

    /// Parse and compile one file without installing it.
    pub fn load_file(&self, path: &Path) -> Result<LoadedPlan> {
        compile_file(path)
    }

    /// The installed plan for `id`.
    pub fn plan(&self, id: &str) -> Option<Arc<FilterPlan>> {
        self.plans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(|loaded| Arc::clone(&loaded.plan))
    }

    /// Sorted ids of the installed plans.
    pub fn plan_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self
            .plans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Shared plan map, updated in place by the watcher.
    pub fn plans(&self) -> PlanMap {
        Arc::clone(&self.plans)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Start a filesystem watcher.
    ///
    /// Created or modified files are recompiled and swapped in; a file that
    /// fails to compile keeps the previously installed plan. Deleted files
    /// drop their plan.
    pub fn watch(&mut self) -> Result<()> {
        let plans = Arc::clone(&self.plans);

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => handle_fs_event(&event, &plans),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
        )?;

        watcher.watch(&self.config_dir, RecursiveMode::Recursive)?;
        let _ = watcher
            .configure(notify::Config::default().with_poll_interval(Duration::from_millis(500)));

        info!(path = %self.config_dir.display(), "watching filter config directory for changes");
        self._watcher = Some(watcher);
        Ok(())
    }
}

// ── Shared with the watcher ─────────────────────────────────────────

pub(super) enum Applied {
    Installed(String),
    Disabled(String),
}

pub(super) fn is_dotfile(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

pub(super) fn is_config_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e, "yml" | "yaml" | "json"))
        .unwrap_or(false)
}

/// Read a document, picking the parser by extension.
pub(super) fn read_document(path: &Path) -> Result<FilterDocument> {
    let contents = fs::read_to_string(path)?;
    let doc = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => FilterDocument::from_json(&contents)?,
        Some("yml" | "yaml") => FilterDocument::from_yaml(&contents)?,
        _ => {
            return Err(LoaderError::Validation(format!(
                "unsupported file extension: {}",
                path.display()
            )))
        }
    };

    if doc.kind != FILTER_KIND {
        return Err(LoaderError::Validation(format!(
            "expected kind '{}', found '{}'",
            FILTER_KIND, doc.kind
        )));
    }
    if doc.metadata.id.trim().is_empty() {
        return Err(LoaderError::Validation(
            "filter config metadata.id must not be empty".to_string(),
        ));
    }
    Ok(doc)
}

/// Parse and compile one filter config file.
pub fn compile_file(path: &Path) -> Result<LoadedPlan> {
    let doc = read_document(path)?;
    let plan = FilterPlan::compile(&doc.filters)?;
    Ok(LoadedPlan {
        metadata: doc.metadata,
        path: path.to_path_buf(),
        plan: Arc::new(plan),
    })
}

/// Compile `path` and install (or, when disabled, withdraw) its plan.
///
/// Nothing in `plans` changes when compilation fails.
pub(super) fn apply_file(plans: &PlanMap, path: &Path) -> Result<Applied> {
    let loaded = compile_file(path)?;
    let id = loaded.metadata.id.clone();
    let mut guard = plans.write().unwrap_or_else(PoisonError::into_inner);

    // A file whose id changed must not leave its old plan behind.
    guard.retain(|other_id, other| other.path != path || *other_id == id);

    if !loaded.metadata.enabled {
        guard.remove(&id);
        return Ok(Applied::Disabled(id));
    }

    info!(
        plan_id = %id,
        filters = loaded.plan.len(),
        path = %path.display(),
        "installed filter plan"
    );
    guard.insert(id.clone(), loaded);
    Ok(Applied::Installed(id))
}

/// Drop every plan loaded from `path`.
pub(super) fn remove_path(plans: &PlanMap, path: &Path) -> Vec<String> {
    let mut guard = plans.write().unwrap_or_else(PoisonError::into_inner);
    let removed: Vec<String> = guard
        .iter()
        .filter(|(_, loaded)| loaded.path == path)
        .map(|(id, _)| id.clone())
        .collect();
    for id in &removed {
        guard.remove(id);
    }
    removed
}
