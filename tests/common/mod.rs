//! Fake collaborators with explicit control over timing.

#![allow(dead_code)]

use async_trait::async_trait;
use orgstars::error::{FetchError, SubscriptionError};
use orgstars::github::RepositoryFetcher;
use orgstars::live::{LiveUpdates, StarCallback, SubscriptionHandle};
use orgstars::{RepositoryDetail, RepositoryRef};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

pub fn repo(id: u64, stars: u64) -> RepositoryRef {
    RepositoryRef {
        id,
        name: format!("repo{}", id),
        full_name: format!("swiftlang/repo{}", id),
        description: Some(format!("Repository number {}", id)),
        stargazers_count: stars,
    }
}

type Reply = Result<Vec<RepositoryRef>, FetchError>;

/// Answers each organisation from a script. A gated answer waits until the
/// test calls `release`.
#[derive(Default)]
pub struct ScriptedFetcher {
    answers: Mutex<HashMap<String, VecDeque<Reply>>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    release: Mutex<HashMap<String, oneshot::Sender<()>>>,
    calls: Mutex<Vec<String>>,
    served: Mutex<Vec<RepositoryRef>>,
}

impl ScriptedFetcher {
    pub fn answer(&self, organisation: &str, reply: Reply) -> &Self {
        self.answers
            .lock()
            .unwrap()
            .entry(organisation.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn gate(&self, organisation: &str) -> &Self {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(organisation.to_string(), rx);
        self.release.lock().unwrap().insert(organisation.to_string(), tx);
        self
    }

    pub fn release(&self, organisation: &str) {
        if let Some(tx) = self.release.lock().unwrap().remove(organisation) {
            let _ = tx.send(());
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositoryFetcher for ScriptedFetcher {
    async fn fetch_repositories(&self, organisation: &str) -> Result<Vec<RepositoryRef>, FetchError> {
        self.calls.lock().unwrap().push(organisation.to_string());
        let gate = self.gates.lock().unwrap().remove(organisation);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let reply = self
            .answers
            .lock()
            .unwrap()
            .get_mut(organisation)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| Err(FetchError::NotFound(organisation.to_string())));
        if let Ok(repos) = &reply {
            self.served.lock().unwrap().extend(repos.iter().cloned());
        }
        reply
    }

    async fn fetch_repository_detail(&self, full_name: &str) -> Result<RepositoryDetail, FetchError> {
        self.served
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.full_name == full_name)
            .map(|r| RepositoryDetail {
                id: r.id,
                name: r.name.clone(),
                full_name: r.full_name.clone(),
                description: r.description.clone(),
                stargazers_count: r.stargazers_count,
                forks_count: 3,
                network_count: Some(4),
                html_url: format!("https://github.com/{}", r.full_name),
                language: None,
                updated_at: None,
            })
            .ok_or_else(|| FetchError::NotFound(full_name.to_string()))
    }
}

struct Recorded {
    repository_id: u64,
    callback: StarCallback,
    handle_flag: Arc<std::sync::atomic::AtomicBool>,
}

/// Keeps every callback so tests can push deltas by hand, including to
/// subscriptions that have since been cancelled.
#[derive(Default)]
pub struct ManualLive {
    recorded: Mutex<Vec<Recorded>>,
    refused: Mutex<HashSet<u64>>,
}

impl ManualLive {
    pub fn refuse(&self, repository_id: u64) {
        self.refused.lock().unwrap().insert(repository_id);
    }

    /// Deliver `stars` through the most recent subscription for `repository_id`.
    pub fn push(&self, repository_id: u64, stars: u64) {
        let recorded = self.recorded.lock().unwrap();
        if let Some(r) = recorded.iter().rev().find(|r| r.repository_id == repository_id) {
            (r.callback)(stars);
        }
    }

    /// Deliver through the `nth` subscription ever opened, cancelled or not.
    pub fn push_via(&self, nth: usize, stars: u64) {
        let recorded = self.recorded.lock().unwrap();
        (recorded[nth].callback)(stars);
    }

    pub fn opened(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }

    pub fn cancelled(&self) -> usize {
        self.recorded
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.handle_flag.load(Ordering::Acquire))
            .count()
    }
}

#[async_trait]
impl LiveUpdates for ManualLive {
    async fn subscribe(
        &self,
        repository_id: u64,
        _baseline_stars: u64,
        on_update: StarCallback,
    ) -> Result<SubscriptionHandle, SubscriptionError> {
        if self.refused.lock().unwrap().contains(&repository_id) {
            return Err(SubscriptionError::Refused(repository_id));
        }
        let handle = SubscriptionHandle::detached(repository_id);
        self.recorded.lock().unwrap().push(Recorded {
            repository_id,
            callback: on_update,
            handle_flag: handle.cancel_flag(),
        });
        Ok(handle)
    }
}

/// Sends the current count the moment a subscriber attaches, before
/// `subscribe` has returned its handle.
pub struct AnnouncingLive {
    pub current: HashMap<u64, u64>,
}

#[async_trait]
impl LiveUpdates for AnnouncingLive {
    async fn subscribe(
        &self,
        repository_id: u64,
        baseline_stars: u64,
        on_update: StarCallback,
    ) -> Result<SubscriptionHandle, SubscriptionError> {
        on_update(self.current.get(&repository_id).copied().unwrap_or(baseline_stars));
        Ok(SubscriptionHandle::detached(repository_id))
    }
}
