//! Feature fetcher trait, request context and fetch errors.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use recflow_core::{Item, PropertyError, User};

/// Errors a fetcher reports back to the loader. They are logged, never
/// propagated to the request.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("malformed feature payload: {0}")]
    Decode(String),

    #[error(transparent)]
    Property(#[from] PropertyError),
}

/// Request-scoped data handed to every fetcher.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: uuid::Uuid,
    pub scene: String,
    pub started: Instant,
    pub params: HashMap<String, String>,
}

impl RequestContext {
    pub fn new(scene: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4(),
            scene: scene.into(),
            started: Instant::now(),
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// A source of user or item features (a DAO, a cache, a remote service).
///
/// Implementations write into the entity through its property store,
/// typically with `set_many` or `add_cache_features`. Writes from different
/// fetchers are unordered; use distinct cache namespaces to avoid overwrites.
#[async_trait::async_trait]
pub trait FeatureFetcher: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Load features for the request's user.
    async fn fetch_user(&self, user: &User, ctx: &RequestContext) -> Result<(), FetchError>;

    /// Load features for a batch of candidate items.
    async fn fetch_items(
        &self,
        _user: &User,
        _items: &[Arc<Item>],
        _ctx: &RequestContext,
    ) -> Result<(), FetchError> {
        Ok(())
    }
}
