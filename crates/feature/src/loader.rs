//! [`FeatureLoader`]: runs fetchers for a request and waits on their loads.
//!
//! Every load is registered with an [`AsyncLoadCoordinator`] before any
//! fetcher is spawned, each spawned task holds one [`LoadGuard`], and the
//! caller waits with a deadline. Fetchers that miss the deadline keep running
//! and may still write into the entity afterwards.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use recflow_core::{AsyncLoadCoordinator, Entity, Item, LoadGuard, User, WaitOutcome};

use crate::config::FeatureLoadConfig;
use crate::fetcher::{FeatureFetcher, FetchError, RequestContext};

/// Summary of one load phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub outcome: WaitOutcome,
    /// Fetchers started for this phase.
    pub fetchers: usize,
    /// Keys copied out of promoted cache namespaces (summed over entities).
    pub promoted: usize,
    pub elapsed: Duration,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.outcome == WaitOutcome::Completed
    }
}

/// Runs a fixed set of fetchers against request entities.
pub struct FeatureLoader {
    fetchers: Vec<Arc<dyn FeatureFetcher>>,
    config: FeatureLoadConfig,
}

impl FeatureLoader {
    pub fn new(fetchers: Vec<Arc<dyn FeatureFetcher>>, config: FeatureLoadConfig) -> Self {
        Self { fetchers, config }
    }

    pub fn config(&self) -> &FeatureLoadConfig {
        &self.config
    }

    pub fn fetcher_names(&self) -> Vec<&str> {
        self.fetchers.iter().map(|f| f.name()).collect()
    }

    /// Load user features, wait up to the configured timeout, then promote
    /// the configured cache namespaces.
    ///
    /// Uses the user's own coordinator when it is still idle. A user whose
    /// coordinator was already claimed gets a fresh one for this phase.
    pub async fn load_user(&self, user: &Arc<User>, ctx: &Arc<RequestContext>) -> LoadReport {
        let started = Instant::now();

        let outcome = if self.fetchers.is_empty() {
            WaitOutcome::Completed
        } else if !self.config.async_load {
            for fetcher in &self.fetchers {
                let result = fetcher.fetch_user(user, ctx).await;
                log_fetch(fetcher.name(), "user", ctx, result);
            }
            WaitOutcome::Completed
        } else {
            let (coordinator, guards) = self.claim_user_coordinator(user, ctx);
            match guards {
                Some(guards) => {
                    for (fetcher, guard) in self.fetchers.iter().zip(guards) {
                        let fetcher = Arc::clone(fetcher);
                        let user = Arc::clone(user);
                        let ctx = Arc::clone(ctx);
                        tokio::spawn(async move {
                            let result = fetcher.fetch_user(&user, &ctx).await;
                            log_fetch(fetcher.name(), "user", &ctx, result);
                            drop(guard);
                        });
                    }
                    coordinator.wait(self.config.timeout()).await
                }
                None => WaitOutcome::Aborted,
            }
        };

        let promoted = user.load_cache_features_many(&self.config.promote_namespaces);
        self.report("user", ctx, outcome, promoted, started)
    }

    /// Load features for a candidate batch. Each fetcher sees the whole
    /// batch once; promotion runs on every item after the wait.
    pub async fn load_items(
        &self,
        user: &Arc<User>,
        items: &[Arc<Item>],
        ctx: &Arc<RequestContext>,
    ) -> LoadReport {
        let started = Instant::now();

        let outcome = if self.fetchers.is_empty() || items.is_empty() {
            WaitOutcome::Completed
        } else if !self.config.async_load {
            for fetcher in &self.fetchers {
                let result = fetcher.fetch_items(user, items, ctx).await;
                log_fetch(fetcher.name(), "items", ctx, result);
            }
            WaitOutcome::Completed
        } else {
            let coordinator = Arc::new(AsyncLoadCoordinator::new());
            match self.register(&coordinator, ctx) {
                Some(guards) => {
                    let batch: Arc<[Arc<Item>]> = items.into();
                    for (fetcher, guard) in self.fetchers.iter().zip(guards) {
                        let fetcher = Arc::clone(fetcher);
                        let user = Arc::clone(user);
                        let batch = Arc::clone(&batch);
                        let ctx = Arc::clone(ctx);
                        tokio::spawn(async move {
                            let result = fetcher.fetch_items(&user, &batch, &ctx).await;
                            log_fetch(fetcher.name(), "items", &ctx, result);
                            drop(guard);
                        });
                    }
                    coordinator.wait(self.config.timeout()).await
                }
                None => WaitOutcome::Aborted,
            }
        };

        let promoted = items
            .iter()
            .map(|item| item.load_cache_features_many(&self.config.promote_namespaces))
            .sum();
        self.report("items", ctx, outcome, promoted, started)
    }

    /// The user's own coordinator if this phase can claim it while still
    /// idle, otherwise a fresh one.
    fn claim_user_coordinator(
        &self,
        user: &User,
        ctx: &RequestContext,
    ) -> (Arc<AsyncLoadCoordinator>, Option<Vec<LoadGuard>>) {
        let own = user.loader();
        if let Some(guards) = own.try_register_idle(self.fetchers.len()) {
            return (Arc::clone(own), Some(guards));
        }
        debug!(
            request_id = %ctx.request_id,
            phase = ?own.phase(),
            "user coordinator already used, starting a new one"
        );
        let fresh = Arc::new(AsyncLoadCoordinator::new());
        let guards = self.register(&fresh, ctx);
        (fresh, guards)
    }

    fn register(
        &self,
        coordinator: &Arc<AsyncLoadCoordinator>,
        ctx: &RequestContext,
    ) -> Option<Vec<LoadGuard>> {
        match coordinator.register(self.fetchers.len()) {
            Ok(guards) => Some(guards),
            Err(e) => {
                warn!(request_id = %ctx.request_id, error = %e, "cannot register feature loads");
                None
            }
        }
    }

    fn report(
        &self,
        phase: &'static str,
        ctx: &RequestContext,
        outcome: WaitOutcome,
        promoted: usize,
        started: Instant,
    ) -> LoadReport {
        let report = LoadReport {
            outcome,
            fetchers: self.fetchers.len(),
            promoted,
            elapsed: started.elapsed(),
        };
        match outcome {
            WaitOutcome::Completed => debug!(
                request_id = %ctx.request_id,
                scene = %ctx.scene,
                phase,
                promoted,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "feature load complete"
            ),
            WaitOutcome::TimedOut => info!(
                request_id = %ctx.request_id,
                scene = %ctx.scene,
                phase,
                timeout_ms = self.config.timeout_ms,
                "feature load timed out, continuing with partial features"
            ),
            WaitOutcome::Aborted => warn!(
                request_id = %ctx.request_id,
                scene = %ctx.scene,
                phase,
                "feature load aborted, continuing with partial features"
            ),
        }
        report
    }
}

fn log_fetch(name: &str, phase: &'static str, ctx: &RequestContext, result: Result<(), FetchError>) {
    if let Err(e) = result {
        warn!(
            fetcher = name,
            phase,
            request_id = %ctx.request_id,
            error = %e,
            "feature fetch failed"
        );
    }
}
