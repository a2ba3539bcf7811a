use super::AppState;
use crate::domain::external_apis::identity::OAuthError;
use crate::domain::models::credential::CredentialContext;
use crate::domain::repositories::sessions::SessionId;
use axum::{
    extract::{FromRequestParts, Query, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_id";
pub const STATE_COOKIE: &str = "oauth_state";

/// Lifetime of the OAuth `state` cookie, in seconds
const STATE_COOKIE_MAX_AGE: u64 = 600;

/// The session attached to the request, if the session cookie names a live one.
pub struct MaybeAuthenticated(pub Option<(SessionId, CredentialContext)>);

impl FromRequestParts<Arc<AppState>> for MaybeAuthenticated {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(id) =
            read_cookie(&parts.headers, SESSION_COOKIE).and_then(|v| Uuid::parse_str(v).ok())
        else {
            return Ok(Self(None));
        };

        Ok(Self(
            state
                .sessions
                .get(&id)
                .await
                .map(|credential| (id, credential)),
        ))
    }
}

pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn set_cookie(name: &str, value: &str, max_age: Option<u64>, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_cookie(name: &str, secure: bool) -> String {
    set_cookie(name, "", Some(0), secure)
}

#[tracing::instrument(name = "login", skip_all)]
pub async fn login(State(state): State<Arc<AppState>>) -> Response {
    let oauth_state = Uuid::new_v4().to_string();
    match state.identity_provider.authorize_url(&oauth_state) {
        Ok(url) => (
            AppendHeaders([(
                header::SET_COOKIE,
                set_cookie(
                    STATE_COOKIE,
                    &oauth_state,
                    Some(STATE_COOKIE_MAX_AGE),
                    state.secure_cookies,
                ),
            )]),
            Redirect::to(&url),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to build authorize url: {}", e);
            Redirect::to("/").into_response()
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum CallbackError {
    #[error("provider reported `{0}`")]
    Provider(String),
    #[error("state parameter does not match the state cookie")]
    StateMismatch,
    #[error("callback carried no code")]
    MissingCode,
    #[error(transparent)]
    Exchange(#[from] OAuthError),
}

async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    params: CallbackParams,
) -> Result<CredentialContext, CallbackError> {
    if let Some(error) = params.error {
        return Err(CallbackError::Provider(error));
    }
    let expected = read_cookie(headers, STATE_COOKIE).ok_or(CallbackError::StateMismatch)?;
    if params.state.as_deref() != Some(expected) {
        return Err(CallbackError::StateMismatch);
    }
    let code = params.code.ok_or(CallbackError::MissingCode)?;

    Ok(state.identity_provider.exchange_code(&code).await?)
}

#[tracing::instrument(name = "oauth_callback", skip_all)]
pub async fn callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let clear_state = clear_cookie(STATE_COOKIE, state.secure_cookies);

    match authenticate(&state, &headers, params).await {
        Ok(credential) => {
            let session_id = state.sessions.create(credential).await;
            (
                AppendHeaders([
                    (header::SET_COOKIE, clear_state),
                    (
                        header::SET_COOKIE,
                        set_cookie(
                            SESSION_COOKIE,
                            &session_id.to_string(),
                            Some(state.session_ttl.as_secs()),
                            state.secure_cookies,
                        ),
                    ),
                ]),
                Redirect::to("/profile"),
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!("Authentication failed: {}", e);
            (
                AppendHeaders([(header::SET_COOKIE, clear_state)]),
                Redirect::to("/"),
            )
                .into_response()
        }
    }
}

#[tracing::instrument(name = "profile", skip_all)]
pub async fn profile(
    State(state): State<Arc<AppState>>,
    MaybeAuthenticated(session): MaybeAuthenticated,
) -> Response {
    if session.is_none() {
        return Redirect::to("/").into_response();
    }

    match tokio::fs::read_to_string(state.public_dir.join("profile.html")).await {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            tracing::error!("Failed to read profile page: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[tracing::instrument(name = "logout", skip_all)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    MaybeAuthenticated(session): MaybeAuthenticated,
) -> Response {
    if let Some((id, credential)) = session {
        state.sessions.remove(&id).await;
        tracing::info!("Logged out {}", credential.username);
    }

    (
        AppendHeaders([(
            header::SET_COOKIE,
            clear_cookie(SESSION_COOKIE, state.secure_cookies),
        )]),
        Redirect::to("/"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::sessions::SessionStore;
    use crate::infrastructures::adapters::primary::web::test_support::{
        Outcome, app, credential, summary,
    };
    use axum::body::Body;
    use axum::http::{HeaderValue, Request};
    use tower::ServiceExt;

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[test]
    fn test_read_cookie_among_several() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_id=abc; oauth_state=xyz"),
        );
        assert_eq!(read_cookie(&headers, SESSION_COOKIE), Some("abc"));
        assert_eq!(read_cookie(&headers, STATE_COOKIE), Some("xyz"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_secure_flag() {
        assert_eq!(
            set_cookie(SESSION_COOKIE, "v", None, true),
            "session_id=v; Path=/; HttpOnly; SameSite=Lax; Secure"
        );
        assert_eq!(
            clear_cookie(STATE_COOKIE, false),
            "oauth_state=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
        );
    }

    #[tokio::test]
    async fn test_login_redirects_to_provider_with_state() {
        let response = app(Outcome::Summary(summary()))
            .router
            .oneshot(
                Request::builder()
                    .uri("/auth/github")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_redirection());
        let cookie = set_cookies(&response).remove(0);
        let state = cookie
            .strip_prefix("oauth_state=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        assert!(location(&response).ends_with(&format!("state={state}")));
    }

    #[tokio::test]
    async fn test_callback_creates_session() {
        let test_app = app(Outcome::Summary(summary()));
        let response = test_app
            .router
            .oneshot(
                Request::builder()
                    .uri("/auth/github/callback?code=good-code&state=s1")
                    .header(header::COOKIE, "oauth_state=s1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(location(&response), "/profile");
        let session_cookie = set_cookies(&response)
            .into_iter()
            .find(|c| c.starts_with("session_id="))
            .unwrap();
        let id = session_cookie
            .trim_start_matches("session_id=")
            .split(';')
            .next()
            .unwrap();
        let stored = test_app
            .sessions
            .get(&Uuid::parse_str(id).unwrap())
            .await
            .unwrap();
        assert_eq!(stored.username, "alice");
        assert!(session_cookie.contains("Max-Age=86400"));
    }

    #[tokio::test]
    async fn test_callback_rejects_state_mismatch() {
        let response = app(Outcome::Summary(summary()))
            .router
            .oneshot(
                Request::builder()
                    .uri("/auth/github/callback?code=good-code&state=forged")
                    .header(header::COOKIE, "oauth_state=s1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(location(&response), "/");
        assert!(
            set_cookies(&response)
                .iter()
                .all(|c| !c.starts_with("session_id="))
        );
    }

    #[tokio::test]
    async fn test_callback_with_rejected_code_redirects_home() {
        let response = app(Outcome::Summary(summary()))
            .router
            .oneshot(
                Request::builder()
                    .uri("/auth/github/callback?code=expired&state=s1")
                    .header(header::COOKIE, "oauth_state=s1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn test_profile_requires_session() {
        let response = app(Outcome::Summary(summary()))
            .router
            .oneshot(Request::builder().uri("/profile").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn test_profile_with_session() {
        let test_app = app(Outcome::Summary(summary()));
        let id = test_app.sessions.create(credential("alice")).await;

        let response = test_app
            .router
            .oneshot(
                Request::builder()
                    .uri("/profile")
                    .header(header::COOKIE, format!("session_id={id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&body).contains("/user-data"));
    }

    #[tokio::test]
    async fn test_logout_destroys_session() {
        let test_app = app(Outcome::Summary(summary()));
        let id = test_app.sessions.create(credential("alice")).await;

        let response = test_app
            .router
            .oneshot(
                Request::builder()
                    .uri("/logout")
                    .header(header::COOKIE, format!("session_id={id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(location(&response), "/");
        assert!(set_cookies(&response)[0].contains("Max-Age=0"));
        assert!(test_app.sessions.get(&id).await.is_none());
    }
}
