//! Request-scoped user and item entities.
//!
//! Both embed a [`PropertyStore`] (with its cache namespaces) and an
//! [`AsyncLoadCoordinator`]. Entities live for one recommendation request;
//! nothing here is persisted.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::coordinator::AsyncLoadCoordinator;
use crate::properties::PropertyStore;
use crate::value::{Properties, Value};

/// Property key under which [`Item::add_recall_name_feature`] stores the
/// recall source.
pub const RECALL_NAME_KEY: &str = "recall_name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Item,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => write!(f, "user"),
            EntityKind::Item => write!(f, "item"),
        }
    }
}

/// Common surface of users and items, used by feature fetchers.
pub trait Entity: Send + Sync {
    fn id(&self) -> &str;
    fn kind(&self) -> EntityKind;
    fn store(&self) -> &PropertyStore;
    fn loader(&self) -> &Arc<AsyncLoadCoordinator>;
}

// ── User ────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct User {
    id: String,
    store: PropertyStore,
    loader: Arc<AsyncLoadCoordinator>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            store: PropertyStore::new(),
            loader: Arc::new(AsyncLoadCoordinator::new()),
        }
    }

    pub fn with_properties(id: impl Into<String>, properties: Properties) -> Self {
        Self {
            id: id.into(),
            store: PropertyStore::with_properties(properties),
            loader: Arc::new(AsyncLoadCoordinator::new()),
        }
    }

    /// Copy id, properties and cache namespaces; the copy gets its own idle
    /// coordinator.
    pub fn clone_detached(&self) -> Self {
        Self {
            id: self.id.clone(),
            store: self.store.duplicate(),
            loader: Arc::new(AsyncLoadCoordinator::new()),
        }
    }

    pub fn properties(&self) -> Properties {
        self.store.snapshot()
    }
}

impl std::ops::Deref for User {
    type Target = PropertyStore;

    fn deref(&self) -> &PropertyStore {
        &self.store
    }
}

impl Entity for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::User
    }

    fn store(&self) -> &PropertyStore {
        &self.store
    }

    fn loader(&self) -> &Arc<AsyncLoadCoordinator> {
        &self.loader
    }
}

// ── Item ────────────────────────────────────────────────────────────

/// A recommendation candidate.
#[derive(Debug)]
pub struct Item {
    id: String,
    item_type: Option<String>,
    retrieve_source: Option<String>,
    store: PropertyStore,
    loader: Arc<AsyncLoadCoordinator>,
}

impl Item {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            item_type: None,
            retrieve_source: None,
            store: PropertyStore::new(),
            loader: Arc::new(AsyncLoadCoordinator::new()),
        }
    }

    /// Candidate produced by the recall pipeline `source` with `score`.
    pub fn from_recall(id: impl Into<String>, source: impl Into<String>, score: f64) -> Self {
        let item = Self::new(id).with_retrieve_source(source);
        item.set_score(score);
        item
    }

    #[must_use]
    pub fn with_retrieve_source(mut self, source: impl Into<String>) -> Self {
        self.retrieve_source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_item_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    #[must_use]
    pub fn with_properties(self, properties: Properties) -> Self {
        self.store.set_many(properties);
        self
    }

    pub fn retrieve_source(&self) -> Option<&str> {
        self.retrieve_source.as_deref()
    }

    pub fn item_type(&self) -> Option<&str> {
        self.item_type.as_deref()
    }

    // Scores share the store's lock.

    pub fn score(&self) -> f64 {
        self.store.read().scores.score
    }

    pub fn set_score(&self, score: f64) {
        self.store.write().scores.score = score;
    }

    /// Overwrite the contribution of `algo`.
    pub fn add_algo_score(&self, algo: impl Into<String>, score: f64) {
        self.store
            .write()
            .scores
            .algo_scores
            .insert(algo.into(), score);
    }

    /// Accumulate into the contribution of `algo`, starting from zero.
    pub fn incr_algo_score(&self, algo: impl Into<String>, delta: f64) {
        *self
            .store
            .write()
            .scores
            .algo_scores
            .entry(algo.into())
            .or_insert(0.0) += delta;
    }

    pub fn algo_score(&self, algo: &str) -> Option<f64> {
        self.store.read().scores.algo_scores.get(algo).copied()
    }

    pub fn algo_scores(&self) -> HashMap<String, f64> {
        self.store.read().scores.algo_scores.clone()
    }

    /// Feature export: properties with `retrieve_source → score` materialized,
    /// read and written in one critical section.
    ///
    /// The source key is written only when absent, so an explicit feature of
    /// the same name is never overwritten and repeated calls are no-ops.
    pub fn features(&self) -> Properties {
        let Some(source) = &self.retrieve_source else {
            return self.store.snapshot();
        };
        let mut state = self.store.write();
        let score = state.scores.score;
        state
            .properties
            .entry(source.clone())
            .or_insert(Value::Float(score));
        state.properties.clone()
    }

    /// Store the recall source under [`RECALL_NAME_KEY`] if not already set.
    pub fn add_recall_name_feature(&self) {
        if let Some(source) = &self.retrieve_source {
            self.store
                .write()
                .properties
                .entry(RECALL_NAME_KEY.to_string())
                .or_insert_with(|| Value::String(source.clone()));
        }
    }

    /// Independent copy with the same properties and scores.
    pub fn deep_clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            item_type: self.item_type.clone(),
            retrieve_source: self.retrieve_source.clone(),
            store: self.store.duplicate(),
            loader: Arc::new(AsyncLoadCoordinator::new()),
        }
    }
}

impl std::ops::Deref for Item {
    type Target = PropertyStore;

    fn deref(&self) -> &PropertyStore {
        &self.store
    }
}

impl Entity for Item {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Item
    }

    fn store(&self) -> &PropertyStore {
        &self.store
    }

    fn loader(&self) -> &Arc<AsyncLoadCoordinator> {
        &self.loader
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn user_embeds_property_store() {
        let user = User::new("u1");
        user.set("budget", 100.0);
        assert_eq!(user.id(), "u1");
        assert_eq!(user.kind(), EntityKind::User);
        assert_eq!(user.get_float("budget").unwrap(), 100.0);
        assert_eq!(user.properties().len(), 1);
    }

    #[test]
    fn detached_clone_has_fresh_loader() {
        let user = User::new("u1");
        user.set("a", 1);
        user.add_cache_features("ns", Properties::from([("b".into(), Value::Int(2))]));
        user.loader().increment(1).unwrap();

        let copy = user.clone_detached();
        assert_eq!(copy.get_int("a").unwrap(), 1);
        assert_eq!(copy.cache_features("ns").len(), 1);
        assert_eq!(copy.loader().pending(), 0);
    }

    #[test]
    fn algo_scores_overwrite_and_accumulate() {
        let item = Item::new("i1");
        item.add_algo_score("dssm", 0.4);
        item.add_algo_score("dssm", 0.5);
        item.incr_algo_score("boost", 0.1);
        item.incr_algo_score("boost", 0.2);

        assert_eq!(item.algo_score("dssm"), Some(0.5));
        assert!((item.algo_score("boost").unwrap() - 0.3).abs() < 1e-12);
        assert_eq!(item.algo_score("missing"), None);
        assert_eq!(item.algo_scores().len(), 2);
    }

    #[test]
    fn concurrent_algo_increments() {
        let item = Arc::new(Item::new("i1"));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let item = Arc::clone(&item);
                thread::spawn(move || {
                    for _ in 0..250 {
                        item.incr_algo_score("hits", 1.0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(item.algo_score("hits"), Some(1000.0));
    }

    #[test]
    fn features_materialize_retrieve_source_once() {
        let item = Item::from_recall("i1", "swing_recall", 0.8);
        assert!(!item.contains("swing_recall"));

        let features = item.features();
        assert_eq!(features["swing_recall"], Value::Float(0.8));

        item.set_score(0.1);
        let again = item.features();
        assert_eq!(again["swing_recall"], Value::Float(0.8));
    }

    #[test]
    fn concurrent_exports_agree_with_a_rescore() {
        let item = Arc::new(Item::from_recall("i1", "hot", 1.0));
        let rescore = {
            let item = Arc::clone(&item);
            thread::spawn(move || item.set_score(2.0))
        };
        let exports: Vec<_> = (0..4)
            .map(|_| {
                let item = Arc::clone(&item);
                thread::spawn(move || item.features()["hot"].clone())
            })
            .collect();
        rescore.join().unwrap();

        let seen: Vec<Value> = exports.into_iter().map(|h| h.join().unwrap()).collect();
        let first = seen[0].clone();
        assert!(first == Value::Float(1.0) || first == Value::Float(2.0));
        assert!(seen.iter().all(|v| *v == first));
        assert_eq!(item.get("hot"), Some(first));
    }

    #[test]
    fn features_never_overwrite_existing_key() {
        let item = Item::from_recall("i1", "hot", 0.5);
        item.set("hot", "explicit");
        assert_eq!(item.features()["hot"], Value::from("explicit"));
    }

    #[test]
    fn features_without_source_are_plain_snapshot() {
        let item = Item::new("i1");
        item.set("price", 10);
        assert_eq!(item.features(), item.snapshot());
    }

    #[test]
    fn recall_name_feature() {
        let item = Item::from_recall("i1", "u2i", 1.0);
        item.add_recall_name_feature();
        assert_eq!(item.get_string(RECALL_NAME_KEY).unwrap(), "u2i");
    }

    #[test]
    fn deep_clone_is_independent() {
        let item = Item::from_recall("i1", "hot", 0.5).with_item_type("video");
        item.set("price", 10);
        item.add_algo_score("m", 1.0);

        let copy = item.deep_clone();
        copy.set("price", 20);
        copy.set_score(0.9);

        assert_eq!(item.get_int("price").unwrap(), 10);
        assert_eq!(item.score(), 0.5);
        assert_eq!(copy.algo_score("m"), Some(1.0));
        assert_eq!(copy.item_type(), Some("video"));
    }
}
