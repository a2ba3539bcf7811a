use crate::domain::models::credential::CredentialContext;
use crate::domain::repositories::sessions::{SessionId, SessionStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

/// Lifetime of a session unless configured otherwise
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct Entry {
    credential: CredentialContext,
    created_at: Instant,
}

/// Process-local sessions; everything is lost on restart.
///
/// Entries older than `ttl` are treated as absent and are pruned whenever a new
/// session is created.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Entry>>,
    ttl: Duration,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_live(&self, entry: &Entry) -> bool {
        entry.created_at.elapsed() < self.ttl
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, credential: CredentialContext) -> SessionId {
        let id = Uuid::new_v4();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| self.is_live(entry));
        if sessions.len() < before {
            tracing::debug!("Pruned {} expired sessions", before - sessions.len());
        }
        sessions.insert(
            id,
            Entry {
                credential,
                created_at: Instant::now(),
            },
        );
        tracing::debug!("Created session {}", id);
        id
    }

    async fn get(&self, id: &SessionId) -> Option<CredentialContext> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                Some(entry) if self.is_live(entry) => return Some(entry.credential.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // expired
        if self.sessions.write().await.remove(id).is_some() {
            tracing::debug!("Session {} expired", id);
        }
        None
    }

    async fn remove(&self, id: &SessionId) {
        if self.sessions.write().await.remove(id).is_some() {
            tracing::debug!("Removed session {}", id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> CredentialContext {
        CredentialContext::new(
            "alice".to_string(),
            "gho_token".to_string(),
            "https://avatars.example/alice".to_string(),
        )
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = InMemorySessionStore::new();

        let id = store.create(credential()).await;
        assert_eq!(store.get(&id).await, Some(credential()));

        store.remove(&id).await;
        assert_eq!(store.get(&id).await, None);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemorySessionStore::new();

        let first = store.create(credential()).await;
        let second = store.create(credential()).await;
        assert_ne!(first, second);

        store.remove(&first).await;
        assert!(store.get(&second).await.is_some());
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() {
        let store = InMemorySessionStore::with_ttl(Duration::from_millis(20));

        let id = store.create(credential()).await;
        assert!(store.get(&id).await.is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get(&id).await, None);
        assert!(store.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_prunes_expired_sessions() {
        let store = InMemorySessionStore::with_ttl(Duration::from_millis(20));

        let stale = store.create(credential()).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        let fresh = store.create(credential()).await;

        let sessions = store.sessions.read().await;
        assert!(!sessions.contains_key(&stale));
        assert!(sessions.contains_key(&fresh));
    }
}
