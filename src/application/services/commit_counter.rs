use crate::domain::external_apis::github::{FetchError, GitHubApi, Repository};
use crate::domain::models::credential::CredentialContext;

/// Number of commits the commits endpoint reports for `repository`.
///
/// A conflict means the repository is empty and counts as zero. Every other
/// failure is returned to the caller untouched.
#[tracing::instrument(name = "count_commits", skip_all, fields(repository = %repository))]
pub async fn count_commits<G>(
    github_api: &G,
    credential: &CredentialContext,
    repository: &Repository,
) -> Result<u64, FetchError>
where
    G: GitHubApi + Send + Sync + ?Sized,
{
    match github_api.list_commits(credential, repository).await {
        Ok(commits) => Ok(commits.len() as u64),
        Err(FetchError::Conflict { .. }) => {
            tracing::warn!("Skipping empty repository: {}", repository);
            Ok(0)
        }
        Err(e) => Err(e),
    }
}
