use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity and access token of the signed-in user, resolved once per request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialContext {
    pub username: String,
    pub bearer_token: String,
    pub avatar_url: String,
}

impl CredentialContext {
    pub fn new(username: String, bearer_token: String, avatar_url: String) -> Self {
        Self {
            username,
            bearer_token,
            avatar_url,
        }
    }
}

// The token must never end up in logs or spans.
impl fmt::Debug for CredentialContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialContext")
            .field("username", &self.username)
            .field("bearer_token", &"<redacted>")
            .field("avatar_url", &self.avatar_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let credential = CredentialContext::new(
            "alice".to_string(),
            "gho_secret".to_string(),
            "https://avatars.example/alice".to_string(),
        );

        let rendered = format!("{credential:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("gho_secret"));
    }
}
