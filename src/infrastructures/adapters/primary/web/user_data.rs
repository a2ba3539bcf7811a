use super::AppState;
use super::auth::MaybeAuthenticated;
use crate::application::use_cases::aggregate_user_data::AggregateUserDataUseCaseInput;
use crate::domain::models::summary::UserSummary;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

/// The only failure bodies `/user-data` ever returns.
#[derive(Debug, thiserror::Error)]
pub enum UserDataError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error(
        "Conflict: Request could not be completed due to a conflict with the current state of the resource"
    )]
    Conflict,
    #[error("Failed to fetch user data")]
    Failed,
}

impl IntoResponse for UserDataError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Failed => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[axum::debug_handler]
pub async fn user_data(
    State(state): State<Arc<AppState>>,
    MaybeAuthenticated(session): MaybeAuthenticated,
) -> Result<Json<UserSummary>, UserDataError> {
    let Some((_, credential)) = session else {
        return Err(UserDataError::Unauthorized);
    };

    let summary = state
        .use_case
        .execute(AggregateUserDataUseCaseInput { credential })
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                cause = %e.fetch_error(),
                "Error fetching user data"
            );
            if e.is_conflict() {
                UserDataError::Conflict
            } else {
                UserDataError::Failed
            }
        })?;

    tracing::debug!(
        "User data for {}: {} commits, {} open PRs, {} closed PRs, {} open issues, {} closed issues",
        summary.username,
        summary.total_commits,
        summary.open_pull_requests.len(),
        summary.closed_pull_requests.len(),
        summary.open_issues.len(),
        summary.closed_issues.len()
    );

    Ok(Json(summary))
}
