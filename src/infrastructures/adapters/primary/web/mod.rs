pub mod auth;
pub mod user_data;

use crate::application::use_cases::aggregate_user_data::AggregateUserDataUseCase;
use crate::domain::external_apis::identity::IdentityProvider;
use crate::domain::repositories::sessions::SessionStore;
use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

// Structure to hold application state (AppState)
#[derive(Clone)]
pub struct AppState {
    pub use_case: Arc<dyn AggregateUserDataUseCase + Send + Sync>,
    pub identity_provider: Arc<dyn IdentityProvider + Send + Sync>,
    pub sessions: Arc<dyn SessionStore + Send + Sync>,
    pub public_dir: PathBuf,
    pub secure_cookies: bool,
    /// Max-Age of the session cookie; matches the session store's lifetime
    pub session_ttl: Duration,
}

#[tracing::instrument(name = "health_check")]
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // `/` and every other unrouted path come from the public directory
    let static_files = ServeDir::new(&app_state.public_dir);

    Router::new()
        .route("/auth/github", get(auth::login))
        .route("/auth/github/callback", get(auth::callback))
        .route("/profile", get(auth::profile))
        .route("/logout", get(auth::logout))
        .route("/user-data", get(user_data::user_data))
        .route("/health", get(health_check))
        .fallback_service(static_files)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
