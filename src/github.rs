use crate::error::FetchError;
use crate::types::{RepositoryDetail, RepositoryRef};
use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Source of repository listings and details.
#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    async fn fetch_repositories(&self, organisation: &str) -> Result<Vec<RepositoryRef>, FetchError>;

    async fn fetch_repository_detail(&self, full_name: &str) -> Result<RepositoryDetail, FetchError>;
}

pub struct GitHubClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(concat!("orgstars/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn repos_url(&self, kind: &str, owner: &str) -> String {
        format!(
            "{}/{}/{}/repos",
            self.base_url,
            kind,
            urlencoding::encode(owner)
        )
    }

    fn detail_url(&self, full_name: &str) -> Result<String, FetchError> {
        let (owner, name) = full_name
            .split_once('/')
            .filter(|(o, n)| !o.is_empty() && !n.is_empty() && !n.contains('/'))
            .ok_or_else(|| FetchError::NotFound(full_name.to_string()))?;
        Ok(format!(
            "{}/repos/{}/{}",
            self.base_url,
            urlencoding::encode(owner),
            urlencoding::encode(name)
        ))
    }

    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        let mut request = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        tracing::debug!(url, "GitHub request");
        request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))
    }

    async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, FetchError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| FetchError::Malformed(e.to_string()));
        }
        let rate_limited = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            == Some("0");
        Err(classify_status(status, rate_limited, what))
    }
}

fn classify_status(status: StatusCode, rate_limit_exhausted: bool, what: &str) -> FetchError {
    match status {
        StatusCode::NOT_FOUND => FetchError::NotFound(what.to_string()),
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited,
        StatusCode::FORBIDDEN if rate_limit_exhausted => FetchError::RateLimited,
        other => FetchError::Network(format!("GitHub API error: {}", other)),
    }
}

#[async_trait]
impl RepositoryFetcher for GitHubClient {
    async fn fetch_repositories(&self, organisation: &str) -> Result<Vec<RepositoryRef>, FetchError> {
        let response = self.get(&self.repos_url("orgs", organisation)).await?;
        match Self::decode(response, organisation).await {
            // Not an organisation; maybe a user.
            Err(FetchError::NotFound(_)) => {
                let response = self.get(&self.repos_url("users", organisation)).await?;
                Self::decode(response, organisation).await
            }
            other => other,
        }
    }

    async fn fetch_repository_detail(&self, full_name: &str) -> Result<RepositoryDetail, FetchError> {
        let url = self.detail_url(full_name)?;
        let response = self.get(&url).await?;
        Self::decode(response, full_name).await
    }
}
