//! Browse status for one organisation screen.
//!
//! Pure transitions, no I/O. The controller decides *whether* a transition is
//! allowed to happen (generation checks); this module decides *what* it does.

use crate::types::{Query, RepositoryRef};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BrowserState {
    #[default]
    Idle,
    Loading(Query),
    Loaded(Query, Vec<RepositoryRef>),
    Failed(Query, String),
}

impl BrowserState {
    pub fn query(&self) -> Option<&Query> {
        match self {
            BrowserState::Idle => None,
            BrowserState::Loading(q) | BrowserState::Loaded(q, _) | BrowserState::Failed(q, _) => {
                Some(q)
            }
        }
    }
}

/// State plus the live star overrides layered over it.
#[derive(Debug, Default)]
pub struct RepositoryBrowserState {
    state: BrowserState,
    overrides: HashMap<u64, u64>,
}

impl RepositoryBrowserState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &BrowserState {
        &self.state
    }

    pub fn query(&self) -> Option<&Query> {
        self.state.query()
    }

    pub fn current_repositories(&self) -> &[RepositoryRef] {
        match &self.state {
            BrowserState::Loaded(_, repos) => repos,
            _ => &[],
        }
    }

    pub fn effective_star_count(&self, repo: &RepositoryRef) -> u64 {
        self.overrides
            .get(&repo.id)
            .copied()
            .unwrap_or(repo.stargazers_count)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, BrowserState::Loading(_))
    }

    pub fn overrides(&self) -> &HashMap<u64, u64> {
        &self.overrides
    }

    /// Start loading `query`. Drops the previous list and every override.
    pub fn begin(&mut self, query: Query) {
        self.overrides.clear();
        self.state = BrowserState::Loading(query);
    }

    /// Returns false unless currently loading.
    pub fn complete(&mut self, repositories: Vec<RepositoryRef>) -> bool {
        match std::mem::take(&mut self.state) {
            BrowserState::Loading(query) => {
                self.state = BrowserState::Loaded(query, repositories);
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Returns false unless currently loading.
    pub fn fail(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            BrowserState::Loading(query) => {
                let message = failure_message(&query);
                self.state = BrowserState::Failed(query, message);
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Record a live star count for a repository in the loaded list.
    ///
    /// Counts below the fetched baseline and ids outside the list are ignored.
    pub fn record_stars(&mut self, repository_id: u64, stars: u64) -> bool {
        let baseline = self
            .current_repositories()
            .iter()
            .find(|r| r.id == repository_id)
            .map(|r| r.stargazers_count);
        match baseline {
            Some(baseline) if stars >= baseline => {}
            _ => return false,
        }
        self.overrides.insert(repository_id, stars);
        true
    }
}

pub fn failure_message(query: &Query) -> String {
    format!("Could not load repositories for \"{}\"", query)
}
