use crate::domain::external_apis::github::{Commit, FetchError, GitHubApi, Repository};
use crate::domain::models::credential::CredentialContext;
use crate::domain::models::item::Item;
use crate::domain::models::search::SearchQuery;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

const USER_AGENT: &str = "gh-user-summary-rust-app";

/// Page size GitHub applies when none is requested
pub const DEFAULT_PER_PAGE: u8 = 30;

#[derive(Deserialize, Debug, Clone)]
struct GitHubRepositoryResponse {
    name: String,
    owner: GitHubOwnerResponse,
}

#[derive(Deserialize, Debug, Clone)]
struct GitHubOwnerResponse {
    login: String,
}

#[derive(Deserialize, Debug, Clone)]
struct GitHubCommitResponse {
    sha: String,
}

// /search/issues wraps its results, next to total_count and incomplete_results.
#[derive(Deserialize, Debug)]
struct GitHubSearchApiResponse {
    items: Vec<Item>,
}

pub struct GitHubApiAdapter {
    client: Client,
    base_url: String,
    per_page: u8,
}

impl GitHubApiAdapter {
    pub fn new(base_url: String) -> Self {
        Self::with_per_page(base_url, DEFAULT_PER_PAGE)
    }

    pub fn with_per_page(base_url: String, per_page: u8) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            per_page,
        }
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, FetchError> {
        let per_page = self.per_page.to_string();
        let params = params.iter().copied().chain([("per_page", per_page.as_str())]);
        Url::parse_with_params(&format!("{}{}", self.base_url, path), params)
            .map_err(|e| FetchError::Transport(format!("invalid url for {path}: {e}")))
    }

    /// Sends one GET and classifies the outcome. No retries: the caller owns
    /// the tolerance policy.
    async fn execute<T>(
        &self,
        operation_name: &str,
        url: Url,
        credential: &CredentialContext,
    ) -> Result<T, FetchError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", credential.bearer_token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Request failed for {}: {}", operation_name, e);
                FetchError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                "API returned {} for {}: {}",
                status.as_u16(),
                operation_name,
                body
            );
            return Err(if status == StatusCode::CONFLICT {
                FetchError::Conflict { body }
            } else {
                FetchError::Status {
                    status: status.as_u16(),
                    body,
                }
            });
        }

        response.json::<T>().await.map_err(|e| {
            tracing::warn!("Failed to deserialize response for {}: {}", operation_name, e);
            FetchError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl GitHubApi for GitHubApiAdapter {
    #[tracing::instrument(name = "GitHubApiAdapter::search_items", skip_all, fields(query = %query))]
    async fn search_items(
        &self,
        credential: &CredentialContext,
        query: &SearchQuery,
    ) -> Result<Vec<Item>, FetchError> {
        let predicate = query.predicate();
        let url = self.url("/search/issues", &[("q", predicate.as_str())])?;

        let api_response: GitHubSearchApiResponse = self
            .execute(&format!("search `{predicate}`"), url, credential)
            .await?;

        Ok(api_response.items)
    }

    #[tracing::instrument(name = "GitHubApiAdapter::list_repositories", skip_all, fields(owner = %credential.username))]
    async fn list_repositories(
        &self,
        credential: &CredentialContext,
    ) -> Result<Vec<Repository>, FetchError> {
        let url = self.url(&format!("/users/{}/repos", credential.username), &[])?;

        let response_items: Vec<GitHubRepositoryResponse> = self
            .execute(
                &format!("repositories of {}", credential.username),
                url,
                credential,
            )
            .await?;

        let repositories = response_items
            .into_iter()
            .map(|repo_res| Repository {
                name: repo_res.name,
                owner: repo_res.owner.login,
            })
            .collect();

        Ok(repositories)
    }

    #[tracing::instrument(name = "GitHubApiAdapter::list_commits", skip_all, fields(repository = %repository))]
    async fn list_commits(
        &self,
        credential: &CredentialContext,
        repository: &Repository,
    ) -> Result<Vec<Commit>, FetchError> {
        let url = self.url(
            &format!("/repos/{}/{}/commits", repository.owner, repository.name),
            &[],
        )?;

        let response_items: Vec<GitHubCommitResponse> = self
            .execute(&format!("commits of {repository}"), url, credential)
            .await?;

        Ok(response_items
            .into_iter()
            .map(|commit_res| Commit {
                sha: commit_res.sha,
            })
            .collect())
    }
}
