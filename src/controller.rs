//! Drives a [`RepositoryBrowserState`] against the fetch and live-update
//! collaborators.
//!
//! The controller is the single owner of browse state. Fetches and
//! subscription opens run on spawned tasks and report back through one
//! event channel; the owner applies those events with `&mut self`, so no
//! state is ever touched off the owning task. Every event carries the
//! generation of the `load` that produced it, and anything from an older
//! generation is dropped on arrival.

use crate::error::{FetchError, SubscriptionError};
use crate::github::RepositoryFetcher;
use crate::live::{LiveUpdates, StarCallback, SubscriptionHandle};
use crate::state::{BrowserState, RepositoryBrowserState};
use crate::types::{Query, RepositoryDetail, RepositoryRef};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::{AbortHandle, JoinHandle};

const CHANGE_CAPACITY: usize = 256;

/// Asynchronous results funnelled back to the owner.
#[derive(Debug)]
pub enum BrowserEvent {
    FetchCompleted {
        generation: u64,
        result: Result<Vec<RepositoryRef>, FetchError>,
    },
    SubscriptionOpened {
        generation: u64,
        handle: SubscriptionHandle,
    },
    SubscriptionFailed {
        generation: u64,
        repository_id: u64,
        error: SubscriptionError,
    },
    /// Every subscription for `generation` has been attempted.
    SubscriptionsSettled { generation: u64 },
    StarsChanged {
        generation: u64,
        repository_id: u64,
        stars: u64,
    },
}

/// What a presentation layer gets told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserChange {
    StateChanged { generation: u64 },
    StarsChanged { repository_id: u64, stars: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// A fetch is already in flight; nothing is queued.
    Busy,
    /// Input was empty after trimming.
    EmptyQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Started { generation: u64 },
    Rejected(Rejection),
}

pub struct BrowserController {
    state: RepositoryBrowserState,
    generation: u64,
    subscriptions: HashMap<u64, SubscriptionHandle>,
    // Ids whose subscription is being opened for the current generation.
    pending: HashSet<u64>,
    fetch: Option<AbortHandle>,
    opener: Option<JoinHandle<()>>,
    opening: bool,
    fetcher: Arc<dyn RepositoryFetcher>,
    live: Arc<dyn LiveUpdates>,
    default_organisation: Query,
    events_tx: mpsc::UnboundedSender<BrowserEvent>,
    events_rx: mpsc::UnboundedReceiver<BrowserEvent>,
    changes: broadcast::Sender<BrowserChange>,
}

impl BrowserController {
    pub fn new(
        fetcher: Arc<dyn RepositoryFetcher>,
        live: Arc<dyn LiveUpdates>,
        default_organisation: Query,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            state: RepositoryBrowserState::new(),
            generation: 0,
            subscriptions: HashMap::new(),
            pending: HashSet::new(),
            fetch: None,
            opener: None,
            opening: false,
            fetcher,
            live,
            default_organisation,
            events_tx,
            events_rx,
            changes,
        }
    }

    pub fn state(&self) -> &BrowserState {
        self.state.state()
    }

    pub fn browser(&self) -> &RepositoryBrowserState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn default_organisation(&self) -> &Query {
        &self.default_organisation
    }

    pub fn current_repositories(&self) -> &[RepositoryRef] {
        self.state.current_repositories()
    }

    pub fn effective_star_count(&self, repo: &RepositoryRef) -> u64 {
        self.state.effective_star_count(repo)
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// Repository ids with a live subscription for the current generation.
    pub fn active_subscriptions(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.subscriptions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn repository_at(&self, index: usize) -> Option<&RepositoryRef> {
        self.state.current_repositories().get(index)
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<BrowserChange> {
        self.changes.subscribe()
    }

    /// Swap the fetch collaborator, e.g. after the access token changed.
    /// A fetch already in flight keeps using the old one.
    pub fn set_fetcher(&mut self, fetcher: Arc<dyn RepositoryFetcher>) {
        self.fetcher = fetcher;
    }

    /// Start loading `query`. Must be called inside a tokio runtime.
    pub fn load(&mut self, query: Query) -> LoadOutcome {
        if self.state.is_busy() {
            tracing::debug!(%query, "load rejected, fetch already in flight");
            return LoadOutcome::Rejected(Rejection::Busy);
        }

        self.cancel_subscriptions();
        self.generation += 1;
        let generation = self.generation;
        tracing::info!(%query, generation, "loading repositories");
        self.state.begin(query.clone());
        self.notify(BrowserChange::StateChanged { generation });

        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.events_tx.clone();
        let fetch = tokio::spawn(async move { fetcher.fetch_repositories(query.as_str()).await });
        self.fetch = Some(fetch.abort_handle());
        tokio::spawn(async move {
            let result = match fetch.await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => return,
                Err(e) => Err(FetchError::Network(format!("fetch task failed: {}", e))),
            };
            let _ = tx.send(BrowserEvent::FetchCompleted { generation, result });
        });

        LoadOutcome::Started { generation }
    }

    pub fn search(&mut self, text: &str) -> LoadOutcome {
        match Query::parse(text) {
            Some(query) => self.load(query),
            None => LoadOutcome::Rejected(Rejection::EmptyQuery),
        }
    }

    pub fn reset(&mut self) -> LoadOutcome {
        self.load(self.default_organisation.clone())
    }

    /// Fetch the detail view for `full_name` through the current fetcher.
    pub async fn repository_detail(&self, full_name: &str) -> Result<RepositoryDetail, FetchError> {
        self.fetcher.fetch_repository_detail(full_name).await
    }

    /// Wait for the next asynchronous result.
    pub async fn next_event(&mut self) -> Option<BrowserEvent> {
        self.events_rx.recv().await
    }

    /// Pull and apply one event. Returns false if the channel is gone.
    pub async fn process_next(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// No fetch in flight and no subscription batch still opening.
    pub fn is_settled(&self) -> bool {
        !self.state.is_busy() && !self.opening
    }

    /// Apply events until the current fetch and its subscription batch are done.
    pub async fn run_until_settled(&mut self) {
        while !self.is_settled() {
            if !self.process_next().await {
                break;
            }
        }
    }

    pub fn handle_event(&mut self, event: BrowserEvent) {
        match event {
            BrowserEvent::FetchCompleted { generation, result } => {
                if self.is_stale(generation) {
                    tracing::debug!(generation, current = self.generation, "dropping stale fetch result");
                    return;
                }
                self.fetch = None;
                self.apply_fetch(generation, result);
            }
            BrowserEvent::SubscriptionOpened { generation, handle } => {
                if self.is_stale(generation) {
                    tracing::debug!(
                        generation,
                        repository_id = handle.repository_id(),
                        "cancelling subscription from stale load"
                    );
                    handle.cancel();
                    return;
                }
                self.pending.remove(&handle.repository_id());
                if let Some(previous) = self.subscriptions.insert(handle.repository_id(), handle) {
                    previous.cancel();
                }
            }
            BrowserEvent::SubscriptionFailed {
                generation,
                repository_id,
                error,
            } => {
                if !self.is_stale(generation) {
                    self.pending.remove(&repository_id);
                    tracing::warn!(repository_id, %error, "live updates unavailable for repository");
                }
            }
            BrowserEvent::SubscriptionsSettled { generation } => {
                if !self.is_stale(generation) {
                    self.opening = false;
                    self.opener = None;
                }
            }
            BrowserEvent::StarsChanged {
                generation,
                repository_id,
                stars,
            } => {
                let live = self.subscriptions.contains_key(&repository_id)
                    || self.pending.contains(&repository_id);
                if self.is_stale(generation) || !live {
                    tracing::trace!(generation, repository_id, "ignoring star update");
                    return;
                }
                if self.state.record_stars(repository_id, stars) {
                    self.notify(BrowserChange::StarsChanged { repository_id, stars });
                }
            }
        }
    }

    fn is_stale(&self, generation: u64) -> bool {
        generation != self.generation
    }

    fn apply_fetch(&mut self, generation: u64, result: Result<Vec<RepositoryRef>, FetchError>) {
        match result {
            Ok(repositories) => {
                let targets: Vec<(u64, u64)> = repositories
                    .iter()
                    .map(|r| (r.id, r.stargazers_count))
                    .collect();
                if !self.state.complete(repositories) {
                    return;
                }
                tracing::info!(generation, count = targets.len(), "repositories loaded");
                self.notify(BrowserChange::StateChanged { generation });
                self.open_subscriptions(generation, targets);
            }
            Err(error) => {
                if !self.state.fail() {
                    return;
                }
                tracing::warn!(generation, %error, "repository fetch failed");
                self.notify(BrowserChange::StateChanged { generation });
            }
        }
    }

    fn open_subscriptions(&mut self, generation: u64, targets: Vec<(u64, u64)>) {
        let live = Arc::clone(&self.live);
        let tx = self.events_tx.clone();
        self.pending = targets.iter().map(|(id, _)| *id).collect();
        self.opening = true;
        self.opener = Some(tokio::spawn(async move {
            for (repository_id, baseline) in targets {
                let update_tx = tx.clone();
                let on_update: StarCallback = Box::new(move |stars| {
                    let _ = update_tx.send(BrowserEvent::StarsChanged {
                        generation,
                        repository_id,
                        stars,
                    });
                });
                let event = match live.subscribe(repository_id, baseline, on_update).await {
                    Ok(handle) => BrowserEvent::SubscriptionOpened { generation, handle },
                    Err(error) => BrowserEvent::SubscriptionFailed {
                        generation,
                        repository_id,
                        error,
                    },
                };
                if tx.send(event).is_err() {
                    return;
                }
            }
            let _ = tx.send(BrowserEvent::SubscriptionsSettled { generation });
        }));
    }

    fn cancel_subscriptions(&mut self) {
        if let Some(opener) = self.opener.take() {
            opener.abort();
        }
        self.opening = false;
        self.pending.clear();
        for (_, handle) in self.subscriptions.drain() {
            handle.cancel();
        }
    }

    fn notify(&self, change: BrowserChange) {
        // No receivers is fine.
        let _ = self.changes.send(change);
    }
}

impl Drop for BrowserController {
    fn drop(&mut self) {
        if let Some(fetch) = self.fetch.take() {
            fetch.abort();
        }
        self.cancel_subscriptions();
    }
}

pub fn detail_failure_message(full_name: &str) -> String {
    format!("Could not load \"{}\"", full_name)
}
