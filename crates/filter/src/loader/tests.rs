//! Tests for the filter config loader.

use std::fs;

use notify::event::{DataChange, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use tempfile::TempDir;

use recflow_core::Properties;
use recflow_core::Value;

use super::core::apply_file;
use super::watcher::handle_fs_event;
use super::*;

const HOME_FEED_YAML: &str = r#"
apiVersion: v1
kind: FilterConfig
metadata:
  id: home-feed
  name: Home feed
filters:
  - Name: price
    Operator: less
    Type: float
    Value: user.budget
  - Name: rating
    Operator: greater
    Type: float
    Value: 4.0
"#;

const SEARCH_JSON: &str = r#"{
  "apiVersion": "v1",
  "kind": "FilterConfig",
  "metadata": {"id": "search", "name": "Search"},
  "filters": [
    {"Name": "banned", "Operator": "is_null"}
  ]
}"#;

fn temp_loader() -> (TempDir, FilterLoader) {
    let dir = TempDir::new().expect("create tempdir");
    let loader = FilterLoader::new(dir.path().to_path_buf());
    (dir, loader)
}

fn props(pairs: &[(&str, Value)]) -> Properties {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn count(results: &[LoadResult], pred: fn(&LoadStatus) -> bool) -> usize {
    results.iter().filter(|r| pred(&r.status)).count()
}

#[test]
fn load_file_compiles_yaml() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("home.yml");
    fs::write(&path, HOME_FEED_YAML).unwrap();

    let loaded = loader.load_file(&path).unwrap();
    assert_eq!(loaded.metadata.id, "home-feed");
    assert_eq!(loaded.plan.len(), 2);
    // load_file does not install.
    assert!(loader.plan("home-feed").is_none());
}

#[test]
fn load_all_reads_yaml_and_json() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("home.yaml"), HOME_FEED_YAML).unwrap();
    fs::write(dir.path().join("search.json"), SEARCH_JSON).unwrap();

    let results = loader.load_all().unwrap();
    assert_eq!(count(&results, |s| matches!(s, LoadStatus::Loaded { .. })), 2);
    assert_eq!(loader.plan_ids(), vec!["home-feed", "search"]);

    let plan = loader.plan("home-feed").unwrap();
    let user = props(&[("budget", Value::Float(100.0))]);
    let item = props(&[("price", Value::Float(80.0)), ("rating", Value::Float(4.5))]);
    assert!(plan.evaluate(&user, &item).unwrap());
}

#[test]
fn load_all_skips_dotfiles_and_other_extensions() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("home.yml"), HOME_FEED_YAML).unwrap();
    fs::write(dir.path().join(".hidden.yml"), HOME_FEED_YAML).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a filter").unwrap();

    let results = loader.load_all().unwrap();
    assert_eq!(count(&results, |s| matches!(s, LoadStatus::Loaded { .. })), 1);
    assert_eq!(count(&results, |s| matches!(s, LoadStatus::Skipped { .. })), 2);
}

#[test]
fn load_all_recurses_into_subdirectories() {
    let (dir, loader) = temp_loader();
    let sub = dir.path().join("scenes");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("home.yml"), HOME_FEED_YAML).unwrap();

    loader.load_all().unwrap();
    assert!(loader.plan("home-feed").is_some());
}

#[test]
fn load_all_reports_failures_per_file() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("good.yml"), HOME_FEED_YAML).unwrap();
    fs::write(dir.path().join("broken.yml"), "filters: [[[").unwrap();
    fs::write(
        dir.path().join("unknown-op.yml"),
        HOME_FEED_YAML
            .replace("home-feed", "other")
            .replace("Operator: less", "Operator: around"),
    )
    .unwrap();
    fs::write(
        dir.path().join("wrong-kind.yml"),
        HOME_FEED_YAML
            .replace("home-feed", "third")
            .replace("FilterConfig", "AnomalyRule"),
    )
    .unwrap();

    let results = loader.load_all().unwrap();
    assert_eq!(count(&results, |s| matches!(s, LoadStatus::Loaded { .. })), 1);
    assert_eq!(count(&results, |s| matches!(s, LoadStatus::Failed { .. })), 3);

    let unknown = results
        .iter()
        .find(|r| r.path.ends_with("unknown-op.yml"))
        .unwrap();
    match &unknown.status {
        LoadStatus::Failed { error } => assert!(error.contains("around"), "{}", error),
        other => panic!("unexpected status {:?}", other),
    }
    assert_eq!(loader.plan_ids(), vec!["home-feed"]);
}

#[test]
fn disabled_documents_are_skipped() {
    let (dir, loader) = temp_loader();
    let yaml = HOME_FEED_YAML.replace("name: Home feed", "name: Home feed\n  enabled: false");
    fs::write(dir.path().join("home.yml"), yaml).unwrap();

    let results = loader.load_all().unwrap();
    assert_eq!(count(&results, |s| matches!(s, LoadStatus::Skipped { .. })), 1);
    assert!(loader.plan("home-feed").is_none());
}

#[test]
fn new_creates_missing_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("config").join("filters");
    assert!(!nested.exists());

    let loader = FilterLoader::new(nested.clone());
    assert!(nested.exists());
    assert_eq!(loader.config_dir(), nested.as_path());
}

#[test]
fn failed_recompile_keeps_previous_plan() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("home.yml");
    fs::write(&path, HOME_FEED_YAML).unwrap();
    loader.load_all().unwrap();
    let before = loader.plan("home-feed").unwrap();

    fs::write(&path, HOME_FEED_YAML.replace("Type: float", "Type: decimal")).unwrap();
    assert!(apply_file(&loader.plans(), &path).is_err());

    let after = loader.plan("home-feed").unwrap();
    assert_eq!(*before, *after);
}

#[test]
fn modify_event_swaps_in_new_plan() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("home.yml");
    fs::write(&path, HOME_FEED_YAML).unwrap();
    loader.load_all().unwrap();

    let stricter = HOME_FEED_YAML.replace("Value: 4.0", "Value: 4.8");
    fs::write(&path, stricter).unwrap();
    let event = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
        .add_path(path.clone());
    handle_fs_event(&event, &loader.plans());

    let plan = loader.plan("home-feed").unwrap();
    let user = props(&[("budget", Value::Float(100.0))]);
    let item = props(&[("price", Value::Float(80.0)), ("rating", Value::Float(4.5))]);
    assert!(!plan.evaluate(&user, &item).unwrap());
}

#[test]
fn changed_id_replaces_old_plan() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("home.yml");
    fs::write(&path, HOME_FEED_YAML).unwrap();
    loader.load_all().unwrap();

    fs::write(&path, HOME_FEED_YAML.replace("id: home-feed", "id: home-feed-v2")).unwrap();
    apply_file(&loader.plans(), &path).unwrap();

    assert_eq!(loader.plan_ids(), vec!["home-feed-v2"]);
}

#[test]
fn remove_event_drops_plan() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("search.json");
    fs::write(&path, SEARCH_JSON).unwrap();
    loader.load_all().unwrap();
    assert!(loader.plan("search").is_some());

    fs::remove_file(&path).unwrap();
    let event = Event::new(EventKind::Remove(RemoveKind::File)).add_path(path);
    handle_fs_event(&event, &loader.plans());

    assert!(loader.plan("search").is_none());
}
