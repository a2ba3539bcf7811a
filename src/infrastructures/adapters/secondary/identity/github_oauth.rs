use crate::domain::external_apis::identity::{IdentityProvider, OAuthError};
use crate::domain::models::credential::CredentialContext;
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};

const USER_AGENT: &str = "gh-user-summary-rust-app";
const SCOPE: &str = "user:email";

#[derive(Serialize, Debug)]
struct AccessTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

// GitHub answers 200 for rejected codes too, with `error` set instead of a token.
#[derive(Deserialize, Debug)]
struct AccessTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GitHubUserResponse {
    login: String,
    avatar_url: String,
}

pub struct GitHubOAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    pub oauth_base_url: String,
    pub api_base_url: String,
}

pub struct GitHubOAuthAdapter {
    client: Client,
    settings: GitHubOAuthSettings,
}

impl GitHubOAuthAdapter {
    pub fn new(mut settings: GitHubOAuthSettings) -> Self {
        settings.oauth_base_url = settings.oauth_base_url.trim_end_matches('/').to_string();
        settings.api_base_url = settings.api_base_url.trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            settings,
        }
    }

    async fn check_status(response: Response) -> Result<Response, OAuthError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(OAuthError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch_access_token(&self, code: &str) -> Result<String, OAuthError> {
        let url = format!("{}/login/oauth/access_token", self.settings.oauth_base_url);
        let response = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .json(&AccessTokenRequest {
                client_id: &self.settings.client_id,
                client_secret: &self.settings.client_secret,
                code,
                redirect_uri: &self.settings.callback_url,
            })
            .send()
            .await
            .map_err(|e| OAuthError::Request(e.to_string()))?;

        let token_response: AccessTokenResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| OAuthError::Decode(e.to_string()))?;

        match token_response {
            AccessTokenResponse {
                access_token: Some(token),
                ..
            } => Ok(token),
            AccessTokenResponse { error, error_description, .. } => Err(OAuthError::Denied {
                error: error.unwrap_or_else(|| "missing_access_token".to_string()),
                description: error_description.unwrap_or_default(),
            }),
        }
    }

    async fn fetch_user(&self, token: &str) -> Result<GitHubUserResponse, OAuthError> {
        let url = format!("{}/user", self.settings.api_base_url);
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {token}"))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| OAuthError::Request(e.to_string()))?;

        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| OAuthError::Decode(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for GitHubOAuthAdapter {
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        let url = Url::parse_with_params(
            &format!("{}/login/oauth/authorize", self.settings.oauth_base_url),
            &[
                ("client_id", self.settings.client_id.as_str()),
                ("redirect_uri", self.settings.callback_url.as_str()),
                ("scope", SCOPE),
                ("state", state),
            ],
        )
        .map_err(|e| OAuthError::Request(format!("invalid authorize url: {e}")))?;
        Ok(url.into())
    }

    #[tracing::instrument(name = "GitHubOAuthAdapter::exchange_code", skip_all)]
    async fn exchange_code(&self, code: &str) -> Result<CredentialContext, OAuthError> {
        let token = self.fetch_access_token(code).await?;
        let user = self.fetch_user(&token).await?;
        tracing::info!("Authenticated GitHub user {}", user.login);

        Ok(CredentialContext::new(user.login, token, user.avatar_url))
    }
}
