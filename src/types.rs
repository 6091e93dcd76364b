use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A repository as listed for an organisation. Baseline stars are whatever
/// GitHub reported at fetch time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub stargazers_count: u64,
}

/// The single-repository view, with the counts the listing endpoint omits.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDetail {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    #[serde(default)]
    pub network_count: Option<u64>,
    pub html_url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RepositoryDetail {
    /// Forks as GitHub shows them on the repository page.
    pub fn forks(&self) -> u64 {
        self.network_count.unwrap_or(self.forks_count)
    }
}

pub const DEFAULT_ORGANISATION: &str = "swiftlang";

/// A trimmed, non-empty organisation or user name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Default for Query {
    fn default() -> Self {
        Query(DEFAULT_ORGANISATION.to_string())
    }
}

impl Query {
    /// Trim `text`; `None` if nothing is left.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Query(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Query {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
