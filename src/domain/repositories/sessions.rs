use crate::domain::models::credential::CredentialContext;
use async_trait::async_trait;
use uuid::Uuid;

pub type SessionId = Uuid;

#[async_trait]
pub trait SessionStore {
    async fn create(&self, credential: CredentialContext) -> SessionId;
    async fn get(&self, id: &SessionId) -> Option<CredentialContext>;
    async fn remove(&self, id: &SessionId);
}
