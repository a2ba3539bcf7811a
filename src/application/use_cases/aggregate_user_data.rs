use crate::application::services::commit_counter::count_commits;
use crate::domain::external_apis::github::{FetchError, GitHubApi};
use crate::domain::models::credential::CredentialContext;
use crate::domain::models::item::Item;
use crate::domain::models::search::{ItemKind, ItemState, SearchQuery};
use crate::domain::models::summary::UserSummary;
use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use std::sync::Arc;

/// Concurrent commit lookups per aggregation unless configured otherwise
pub const DEFAULT_COMMIT_FETCH_CONCURRENCY: usize = 8;

#[derive(Debug, Clone)]
pub struct AggregateUserDataUseCaseInput {
    pub credential: CredentialContext,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateUserDataError {
    #[error("failed to search `{query}`")]
    Search {
        query: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to list repositories of {owner}")]
    Repositories {
        owner: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to count commits of {repository}")]
    Commits {
        repository: String,
        #[source]
        source: FetchError,
    },
}

impl AggregateUserDataError {
    pub fn fetch_error(&self) -> &FetchError {
        match self {
            Self::Search { source, .. }
            | Self::Repositories { source, .. }
            | Self::Commits { source, .. } => source,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.fetch_error().is_conflict()
    }
}

#[async_trait]
pub trait AggregateUserDataUseCase {
    async fn execute(
        &self,
        input: AggregateUserDataUseCaseInput,
    ) -> Result<UserSummary, AggregateUserDataError>;
}

pub struct AggregateUserDataInteractor<G: GitHubApi + Send + Sync + 'static> {
    github_api: Arc<G>,
    commit_fetch_concurrency: usize,
}

impl<G: GitHubApi + Send + Sync + 'static> AggregateUserDataInteractor<G> {
    pub fn new(github_api: Arc<G>) -> Self {
        Self::with_concurrency(github_api, DEFAULT_COMMIT_FETCH_CONCURRENCY)
    }

    pub fn with_concurrency(github_api: Arc<G>, commit_fetch_concurrency: usize) -> Self {
        Self {
            github_api,
            commit_fetch_concurrency: commit_fetch_concurrency.max(1),
        }
    }

    async fn search(
        &self,
        credential: &CredentialContext,
        kind: ItemKind,
        state: ItemState,
    ) -> Result<Vec<Item>, AggregateUserDataError> {
        let query = SearchQuery::new(&credential.username, kind, state);
        let items = self
            .github_api
            .search_items(credential, &query)
            .await
            .map_err(|source| {
                tracing::warn!("Search `{}` failed: {}", query, source);
                AggregateUserDataError::Search {
                    query: query.predicate(),
                    source,
                }
            })?;
        tracing::debug!("`{}` returned {} items", query, items.len());
        Ok(items)
    }
}

#[async_trait]
impl<G: GitHubApi + Send + Sync + 'static> AggregateUserDataUseCase
    for AggregateUserDataInteractor<G>
{
    #[tracing::instrument(
        name = "AggregateUserDataInteractor::execute",
        skip(self, input),
        fields(username = %input.credential.username)
    )]
    async fn execute(
        &self,
        input: AggregateUserDataUseCaseInput,
    ) -> Result<UserSummary, AggregateUserDataError> {
        let credential = &input.credential;
        let github_api = self.github_api.as_ref();

        tracing::info!("Fetching pull requests, issues and repositories...");
        // Every branch runs to completion; a failure does not abort its siblings.
        let (open_pull_requests, closed_pull_requests, open_issues, closed_issues, repositories) = tokio::join!(
            self.search(credential, ItemKind::PullRequest, ItemState::Open),
            self.search(credential, ItemKind::PullRequest, ItemState::Closed),
            self.search(credential, ItemKind::Issue, ItemState::Open),
            self.search(credential, ItemKind::Issue, ItemState::Closed),
            async {
                github_api.list_repositories(credential).await.map_err(|source| {
                    tracing::warn!("Failed to list repositories: {}", source);
                    AggregateUserDataError::Repositories {
                        owner: credential.username.clone(),
                        source,
                    }
                })
            },
        );
        let open_pull_requests = open_pull_requests?;
        let closed_pull_requests = closed_pull_requests?;
        let open_issues = open_issues?;
        let closed_issues = closed_issues?;
        let repositories = repositories?;
        tracing::info!("Fetched {} repositories", repositories.len());

        let counts: Vec<Result<u64, AggregateUserDataError>> = stream::iter(repositories)
            .map(move |repository| async move {
                count_commits(github_api, credential, &repository)
                    .await
                    .map_err(|source| {
                        tracing::warn!("Failed to count commits of {}: {}", repository, source);
                        AggregateUserDataError::Commits {
                            repository: repository.to_string(),
                            source,
                        }
                    })
            })
            .buffer_unordered(self.commit_fetch_concurrency)
            .collect()
            .await;
        let total_commits = counts
            .into_iter()
            .sum::<Result<u64, AggregateUserDataError>>()?;
        tracing::info!("Counted {} commits", total_commits);

        Ok(UserSummary {
            username: credential.username.clone(),
            profile_picture: credential.avatar_url.clone(),
            total_commits,
            open_pull_requests,
            closed_pull_requests,
            open_issues,
            closed_issues,
        })
    }
}
