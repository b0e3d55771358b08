//! Cache namespaces: per-source feature batches held beside the active
//! properties until a consumer promotes them.
//!
//! Namespaces live under the same entity lock as the properties, so
//! promotion is a single exclusive critical section.

use crate::properties::PropertyStore;
use crate::value::Properties;

impl PropertyStore {
    /// Merge `features` into `namespace`, creating it if absent.
    ///
    /// Keys missing from the new batch are preserved.
    pub fn add_cache_features(&self, namespace: impl Into<String>, features: Properties) {
        self.write()
            .cache
            .entry(namespace.into())
            .or_default()
            .extend(features);
    }

    /// Copy of `namespace`; empty if it was never written.
    pub fn cache_features(&self, namespace: &str) -> Properties {
        self.read().cache.get(namespace).cloned().unwrap_or_default()
    }

    pub fn cache_namespaces(&self) -> Vec<String> {
        self.read().cache.keys().cloned().collect()
    }

    /// Promote every pair of `namespace` into the active properties.
    ///
    /// Re-copies the same snapshot when called again, so repeated calls
    /// leave the properties unchanged. Returns the number of keys copied.
    pub fn load_cache_features(&self, namespace: &str) -> usize {
        let mut state = self.write();
        let Some(features) = state.cache.get(namespace).cloned() else {
            return 0;
        };
        let copied = features.len();
        state.properties.extend(features);
        copied
    }

    /// Promote several namespaces in order within one critical section.
    ///
    /// Later namespaces win on key collisions.
    pub fn load_cache_features_many<I, K>(&self, namespaces: I) -> usize
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut state = self.write();
        let mut copied = 0;
        for ns in namespaces {
            if let Some(features) = state.cache.get(ns.as_ref()).cloned() {
                copied += features.len();
                state.properties.extend(features);
            }
        }
        copied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn batch(pairs: &[(&str, i64)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), Value::Int(*v)))
            .collect()
    }

    #[test]
    fn add_merges_per_key() {
        let store = PropertyStore::new();
        store.add_cache_features("hologres", batch(&[("a", 1), ("b", 2)]));
        store.add_cache_features("hologres", batch(&[("b", 20), ("c", 3)]));

        let ns = store.cache_features("hologres");
        assert_eq!(ns, batch(&[("a", 1), ("b", 20), ("c", 3)]));
    }

    #[test]
    fn absent_namespace_is_empty() {
        let store = PropertyStore::new();
        assert!(store.cache_features("nope").is_empty());
        assert_eq!(store.load_cache_features("nope"), 0);
    }

    #[test]
    fn returned_snapshot_is_detached() {
        let store = PropertyStore::new();
        store.add_cache_features("ns", batch(&[("a", 1)]));
        let mut copy = store.cache_features("ns");
        copy.insert("a".into(), Value::Int(99));
        assert_eq!(store.cache_features("ns")["a"], Value::Int(1));
    }

    #[test]
    fn cache_is_invisible_until_promoted() {
        let store = PropertyStore::new();
        store.add_cache_features("redis", batch(&[("ctr", 5)]));
        assert!(!store.contains("ctr"));

        assert_eq!(store.load_cache_features("redis"), 1);
        assert_eq!(store.get_int("ctr").unwrap(), 5);
    }

    #[test]
    fn promotion_is_idempotent() {
        let store = PropertyStore::new();
        store.set("existing", 1);
        store.add_cache_features("ns", batch(&[("a", 1), ("existing", 7)]));

        store.load_cache_features("ns");
        let once = store.snapshot();
        store.load_cache_features("ns");
        assert_eq!(store.snapshot(), once);
        assert_eq!(once["existing"], Value::Int(7));
    }

    #[test]
    fn promote_many_in_order() {
        let store = PropertyStore::new();
        store.add_cache_features("first", batch(&[("k", 1), ("x", 1)]));
        store.add_cache_features("second", batch(&[("k", 2)]));

        let copied = store.load_cache_features_many(["first", "second", "missing"]);
        assert_eq!(copied, 3);
        assert_eq!(store.get_int("k").unwrap(), 2);

        let mut names = store.cache_namespaces();
        names.sort();
        assert_eq!(names, vec!["first".to_string(), "second".to_string()]);
    }
}
