//! Live star-count subscriptions.
//!
//! `MockLiveServer` stands in for a push server: each subscription gets its
//! own ticker task that bumps the count and calls back.

use crate::error::SubscriptionError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Called with the new star count for the subscribed repository.
pub type StarCallback = Box<dyn Fn(u64) + Send + Sync + 'static>;

#[async_trait]
pub trait LiveUpdates: Send + Sync {
    async fn subscribe(
        &self,
        repository_id: u64,
        baseline_stars: u64,
        on_update: StarCallback,
    ) -> Result<SubscriptionHandle, SubscriptionError>;
}

/// Owned handle to one live subscription. Dropping it cancels.
#[derive(Debug)]
pub struct SubscriptionHandle {
    repository_id: u64,
    cancelled: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    pub fn new(repository_id: u64, cancelled: Arc<AtomicBool>, task: Option<JoinHandle<()>>) -> Self {
        Self {
            repository_id,
            cancelled,
            task,
        }
    }

    /// A handle with no backing task, for servers that deliver from elsewhere.
    pub fn detached(repository_id: u64) -> Self {
        Self::new(repository_id, Arc::new(AtomicBool::new(false)), None)
    }

    pub fn repository_id(&self) -> u64 {
        self.repository_id
    }

    /// Shared flag a delivering task checks before each callback.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct MockLiveServer {
    tick: Duration,
    step: u64,
    failing: Mutex<HashSet<u64>>,
}

impl MockLiveServer {
    pub fn new(tick: Duration, step: u64) -> Self {
        Self {
            tick,
            step: step.max(1),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Refuse future subscriptions for `repository_id`.
    pub fn fail_subscriptions_for(&self, repository_id: u64) {
        self.failing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(repository_id);
    }

    fn refuses(&self, repository_id: u64) -> bool {
        self.failing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&repository_id)
    }

    // Busier repositories move faster; keeps the demo from looking uniform.
    fn increment_for(&self, repository_id: u64) -> u64 {
        self.step.saturating_mul(1 + repository_id % 3)
    }
}

impl Default for MockLiveServer {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500), 1)
    }
}

#[async_trait]
impl LiveUpdates for MockLiveServer {
    async fn subscribe(
        &self,
        repository_id: u64,
        baseline_stars: u64,
        on_update: StarCallback,
    ) -> Result<SubscriptionHandle, SubscriptionError> {
        if self.refuses(repository_id) {
            return Err(SubscriptionError::Refused(repository_id));
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let tick = self.tick;
        let increment = self.increment_for(repository_id);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // First tick fires immediately.
            interval.tick().await;
            let mut stars = baseline_stars;
            loop {
                interval.tick().await;
                if flag.load(Ordering::Acquire) {
                    break;
                }
                stars = stars.saturating_add(increment);
                on_update(stars);
            }
        });

        tracing::debug!(repository_id, baseline_stars, "live subscription opened");
        Ok(SubscriptionHandle::new(repository_id, cancelled, Some(task)))
    }
}
