//! [`AsyncLoadCoordinator`]: counting completion barrier for feature loads.
//!
//! Producers register outstanding loads up front, every completion
//! decrements the count and the transition to zero fires a one-shot signal.
//! The pending count and the phase (which doubles as the "already fired"
//! flag) live under one mutex, so concurrent decrements that reach zero can
//! never fire twice.
//!
//! ```text
//! Idle (0, unset) --increment--> Loading (>0) --decrement to 0--> Complete
//!                                     \--decrement below 0--> Aborted
//! ```

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::LoadError;

/// Lifecycle of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Nothing registered yet.
    Idle,
    /// At least one load outstanding.
    Loading,
    /// The count reached zero and the signal fired.
    Complete,
    /// A decrement went below zero; the loading phase is abandoned.
    Aborted,
}

impl LoadPhase {
    const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Aborted)
    }
}

/// Result of waiting on a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Completed,
    TimedOut,
    /// The loading phase hit an invariant violation; use whatever is loaded.
    Aborted,
}

#[derive(Debug)]
struct Counter {
    pending: usize,
    phase: LoadPhase,
}

/// Counting completion barrier with a single-fire broadcast.
#[derive(Debug)]
pub struct AsyncLoadCoordinator {
    counter: Mutex<Counter>,
    fired: Condvar,
    signal: watch::Sender<LoadPhase>,
}

impl AsyncLoadCoordinator {
    pub fn new() -> Self {
        let (signal, _) = watch::channel(LoadPhase::Idle);
        Self {
            counter: Mutex::new(Counter {
                pending: 0,
                phase: LoadPhase::Idle,
            }),
            fired: Condvar::new(),
            signal,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Counter> {
        self.counter.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn pending(&self) -> usize {
        self.lock().pending
    }

    pub fn phase(&self) -> LoadPhase {
        self.lock().phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == LoadPhase::Complete
    }

    /// Register `n` outstanding loads.
    ///
    /// After completion the count still moves but the signal is not re-armed.
    pub fn increment(&self, n: usize) -> Result<usize, LoadError> {
        let mut counter = self.lock();
        match counter.phase {
            LoadPhase::Aborted => return Err(LoadError::Aborted),
            LoadPhase::Complete => {
                warn!(added = n, "loads registered after completion; waiters will not block");
            }
            LoadPhase::Idle if n > 0 => counter.phase = LoadPhase::Loading,
            LoadPhase::Idle | LoadPhase::Loading => {}
        }
        counter.pending += n;
        Ok(counter.pending)
    }

    /// Mark `n` loads as finished and return the remaining count.
    ///
    /// Reaching zero fires the completion signal once. Going below zero
    /// aborts the loading phase and wakes every waiter.
    pub fn decrement(&self, n: usize) -> Result<usize, LoadError> {
        let mut counter = self.lock();
        if counter.phase == LoadPhase::Aborted {
            return Err(LoadError::Aborted);
        }
        if n > counter.pending {
            let err = LoadError::Underflow {
                pending: counter.pending,
                requested: n,
            };
            warn!(error = %err, "aborting loading phase");
            self.fire(&mut counter, LoadPhase::Aborted);
            return Err(err);
        }
        counter.pending -= n;
        if counter.pending == 0 && counter.phase == LoadPhase::Loading {
            debug!("all feature loads finished");
            self.fire(&mut counter, LoadPhase::Complete);
        }
        Ok(counter.pending)
    }

    fn fire(&self, counter: &mut Counter, phase: LoadPhase) {
        counter.phase = phase;
        self.signal.send_replace(phase);
        self.fired.notify_all();
    }

    /// Wait until the signal fires or `timeout` elapses.
    ///
    /// The signal is never reset, so waiting on a completed coordinator
    /// returns immediately.
    pub async fn wait(&self, timeout: Duration) -> WaitOutcome {
        let mut rx = self.signal.subscribe();
        let fired = tokio::time::timeout(timeout, async move {
            rx.wait_for(|phase| phase.is_terminal())
                .await
                .map(|phase| *phase)
        })
        .await;

        match fired {
            Ok(Ok(LoadPhase::Complete)) => WaitOutcome::Completed,
            Ok(Ok(_)) | Ok(Err(_)) => WaitOutcome::Aborted,
            Err(_) => WaitOutcome::TimedOut,
        }
    }

    /// Blocking variant of [`wait`](Self::wait) for threads outside a runtime.
    pub fn wait_blocking(&self, timeout: Duration) -> WaitOutcome {
        let counter = self.lock();
        let (counter, _) = self
            .fired
            .wait_timeout_while(counter, timeout, |c| !c.phase.is_terminal())
            .unwrap_or_else(PoisonError::into_inner);
        match counter.phase {
            LoadPhase::Complete => WaitOutcome::Completed,
            LoadPhase::Aborted => WaitOutcome::Aborted,
            LoadPhase::Idle | LoadPhase::Loading => WaitOutcome::TimedOut,
        }
    }

    /// Register `n` loads at once and hand back one guard per load.
    ///
    /// Registering all loads before any producer starts keeps an early
    /// finisher from completing the barrier prematurely.
    pub fn register(self: &Arc<Self>, n: usize) -> Result<Vec<LoadGuard>, LoadError> {
        self.increment(n)?;
        Ok(self.guards(n))
    }

    /// Like [`register`](Self::register), but only while the coordinator is
    /// still `Idle`. The phase check and the increment happen under one lock,
    /// so of two concurrent callers at most one claims the coordinator.
    /// Returns `None` when it was already used or `n` is zero.
    pub fn try_register_idle(self: &Arc<Self>, n: usize) -> Option<Vec<LoadGuard>> {
        {
            let mut counter = self.lock();
            if counter.phase != LoadPhase::Idle || n == 0 {
                return None;
            }
            counter.phase = LoadPhase::Loading;
            counter.pending += n;
        }
        Some(self.guards(n))
    }

    fn guards(self: &Arc<Self>, n: usize) -> Vec<LoadGuard> {
        (0..n)
            .map(|_| LoadGuard {
                coordinator: Arc::clone(self),
                armed: true,
            })
            .collect()
    }
}

impl Default for AsyncLoadCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// One registered load. Decrements its coordinator exactly once, either
/// through [`complete`](LoadGuard::complete) or on drop.
#[derive(Debug)]
#[must_use = "dropping a LoadGuard immediately marks its load as finished"]
pub struct LoadGuard {
    coordinator: Arc<AsyncLoadCoordinator>,
    armed: bool,
}

impl LoadGuard {
    pub fn complete(mut self) -> Result<usize, LoadError> {
        self.armed = false;
        self.coordinator.decrement(1)
    }
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.coordinator.decrement(1) {
                warn!(error = %e, "load guard release failed");
            }
        }
    }
}
