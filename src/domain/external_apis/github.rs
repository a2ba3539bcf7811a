use crate::domain::models::credential::CredentialContext;
use crate::domain::models::item::Item;
use crate::domain::models::search::SearchQuery;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: String,
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
}

/// Outcome of a single failed call to the GitHub REST API.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// 409, which the commits endpoint uses for a repository without commits.
    #[error("conflict: {body}")]
    Conflict { body: String },
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Read access to a user's GitHub data. Every call is a single attempt.
#[async_trait]
pub trait GitHubApi {
    async fn search_items(
        &self,
        credential: &CredentialContext,
        query: &SearchQuery,
    ) -> Result<Vec<Item>, FetchError>;
    async fn list_repositories(
        &self,
        credential: &CredentialContext,
    ) -> Result<Vec<Repository>, FetchError>;
    async fn list_commits(
        &self,
        credential: &CredentialContext,
        repository: &Repository,
    ) -> Result<Vec<Commit>, FetchError>;
}
