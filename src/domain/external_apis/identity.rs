use crate::domain::models::credential::CredentialContext;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("authorization denied: {error} ({description})")]
    Denied { error: String, description: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// OAuth2 authorization-code flow against the identity provider.
#[async_trait]
pub trait IdentityProvider {
    /// URL the browser is sent to in order to grant access.
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError>;

    /// Trades the callback `code` for a token and resolves the user behind it.
    async fn exchange_code(&self, code: &str) -> Result<CredentialContext, OAuthError>;
}
