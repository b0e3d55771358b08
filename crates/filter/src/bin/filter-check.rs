//! filter-check: evaluate a filter config against sample entities.
//!
//! Loads one `FilterConfig` document (directly, or by plan id from the
//! filter config directory), reads a user and a list of candidate items from
//! JSON files, and prints the admit/reject decision for every item.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use serde::Deserialize;
use tracing::info;

use recflow_core::{Entity, Item, Properties, User};
use recflow_filter::loader::compile_file;
use recflow_filter::{FilterLoader, FilterPlan};

// ── CLI ─────────────────────────────────────────────────────────────

/// Evaluate filter plans against user and item property files.
#[derive(Parser, Debug)]
#[command(name = "filter-check", version, about)]
struct Cli {
    /// Filter config file (YAML or JSON).
    #[arg(long, conflicts_with = "plan")]
    file: Option<PathBuf>,

    /// Plan id to load from the filter config directory.
    #[arg(long)]
    plan: Option<String>,

    /// Filter config directory searched for --plan.
    #[arg(long, env = "RECFLOW_FILTER_DIR", default_value = "config/filters")]
    dir: PathBuf,

    /// JSON file with the user: `{"id": "...", "properties": {...}}`.
    #[arg(long)]
    user: PathBuf,

    /// JSON file with the candidates: `[{"id": "...", "properties": {...}}, ...]`.
    #[arg(long)]
    items: PathBuf,
}

// ── Input files ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UserInput {
    #[serde(default = "default_user_id")]
    id: String,
    #[serde(default)]
    properties: Properties,
}

fn default_user_id() -> String {
    "filter-check".to_string()
}

#[derive(Debug, Deserialize)]
struct ItemInput {
    id: String,
    #[serde(default)]
    retrieve_source: Option<String>,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    properties: Properties,
}

impl ItemInput {
    fn into_item(self) -> Item {
        let item = match self.retrieve_source {
            Some(source) => Item::from_recall(self.id, source, self.score),
            None => {
                let item = Item::new(self.id);
                item.set_score(self.score);
                item
            }
        };
        item.with_properties(self.properties)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

fn resolve_plan(cli: &Cli) -> anyhow::Result<Arc<FilterPlan>> {
    match (&cli.file, &cli.plan) {
        (Some(file), _) => {
            let loaded = compile_file(file)
                .with_context(|| format!("compiling {}", file.display()))?;
            info!(plan_id = %loaded.metadata.id, filters = loaded.plan.len(), "compiled filter config");
            Ok(loaded.plan)
        }
        (None, Some(id)) => {
            let loader = FilterLoader::new(cli.dir.clone());
            loader.load_all()?;
            loader.plan(id).with_context(|| {
                format!(
                    "no enabled plan '{}' in {} (found: {})",
                    id,
                    cli.dir.display(),
                    loader.plan_ids().join(", ")
                )
            })
        }
        (None, None) => bail!("either --file or --plan is required"),
    }
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    recflow_core::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let plan = resolve_plan(&cli)?;

    let user_input: UserInput = read_json(&cli.user)?;
    let user = User::with_properties(user_input.id, user_input.properties);
    let items: Vec<ItemInput> = read_json(&cli.items)?;
    let items: Vec<Item> = items.into_iter().map(ItemInput::into_item).collect();

    let mut admitted = 0usize;
    for item in &items {
        if plan.admit(&user, item) {
            admitted += 1;
            println!("admit   {}", item.id());
        } else {
            println!("reject  {}", item.id());
        }
    }

    info!(
        user_id = %user.id(),
        candidates = items.len(),
        admitted,
        "filter check complete"
    );
    Ok(())
}
