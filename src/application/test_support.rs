use crate::domain::external_apis::github::{Commit, FetchError, GitHubApi, Repository};
use crate::domain::models::credential::CredentialContext;
use crate::domain::models::item::Item;
use crate::domain::models::search::SearchQuery;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::Map;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Tracks how many calls overlap while they sleep.
#[derive(Default)]
pub struct InFlight {
    current: AtomicUsize,
    max: AtomicUsize,
    completed: AtomicUsize,
}

impl InFlight {
    async fn hold(&self, delay: Duration) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(delay).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

/// In-memory `GitHubApi` keyed by search predicate and repository name.
/// Failures are described by status code: 409 maps to `Conflict`.
/// Failures answer at once; successful calls sleep for `delay` first.
#[derive(Default)]
pub struct FakeGitHubApi {
    pub items: HashMap<String, Vec<Item>>,
    pub failing_searches: HashMap<String, u16>,
    pub repositories: Vec<Repository>,
    pub repositories_failure: Option<u16>,
    pub commits: HashMap<String, Result<usize, u16>>,
    pub search_calls: AtomicUsize,
    pub repository_calls: AtomicUsize,
    pub commit_calls: AtomicUsize,
    pub delay: Duration,
    /// Searches and the repository listing
    pub queries_in_flight: InFlight,
    pub commits_in_flight: InFlight,
}

impl FakeGitHubApi {
    pub fn with_repository(mut self, name: &str, commits: Result<usize, u16>) -> Self {
        self.repositories.push(Repository {
            name: name.to_string(),
            owner: "alice".to_string(),
        });
        self.commits.insert(name.to_string(), commits);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn total_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
            + self.repository_calls.load(Ordering::SeqCst)
            + self.commit_calls.load(Ordering::SeqCst)
    }
}

fn failure(status: u16) -> FetchError {
    if status == 409 {
        FetchError::Conflict {
            body: "Git Repository is empty.".to_string(),
        }
    } else {
        FetchError::Status {
            status,
            body: "boom".to_string(),
        }
    }
}

#[async_trait]
impl GitHubApi for FakeGitHubApi {
    async fn search_items(
        &self,
        _credential: &CredentialContext,
        query: &SearchQuery,
    ) -> Result<Vec<Item>, FetchError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let predicate = query.predicate();
        if let Some(status) = self.failing_searches.get(&predicate) {
            return Err(failure(*status));
        }
        self.queries_in_flight.hold(self.delay).await;
        Ok(self.items.get(&predicate).cloned().unwrap_or_default())
    }

    async fn list_repositories(
        &self,
        _credential: &CredentialContext,
    ) -> Result<Vec<Repository>, FetchError> {
        self.repository_calls.fetch_add(1, Ordering::SeqCst);
        match self.repositories_failure {
            Some(status) => Err(failure(status)),
            None => {
                self.queries_in_flight.hold(self.delay).await;
                Ok(self.repositories.clone())
            }
        }
    }

    async fn list_commits(
        &self,
        _credential: &CredentialContext,
        repository: &Repository,
    ) -> Result<Vec<Commit>, FetchError> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        match self.commits.get(&repository.name) {
            Some(Ok(count)) => {
                self.commits_in_flight.hold(self.delay).await;
                Ok((0..*count)
                    .map(|i| Commit {
                        sha: format!("{i:040x}"),
                    })
                    .collect())
            }
            Some(Err(status)) => Err(failure(*status)),
            None => Err(failure(404)),
        }
    }
}

pub fn credential(username: &str) -> CredentialContext {
    CredentialContext::new(
        username.to_string(),
        "gho_test".to_string(),
        format!("https://avatars.example/{username}"),
    )
}

pub fn item(number: u64, title: &str) -> Item {
    Item {
        id: number * 1000,
        number,
        title: title.to_string(),
        state: "open".to_string(),
        html_url: format!("https://github.com/alice/a/issues/{number}"),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        extra: Map::new(),
    }
}
