//! Session-store collaborator.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{CatError, CatResult};
use crate::session::{Session, SessionId};

/// Persistence for sessions keyed by id.
///
/// Implementations only store and return whole sessions; serializing
/// concurrent writers to one session is the service's job.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: Session) -> CatResult<()>;

    /// Fetch a copy of the session, or [`CatError::SessionNotFound`].
    async fn get(&self, session_id: &str) -> CatResult<Session>;

    /// Replace a stored session.
    async fn update(&self, session: Session) -> CatResult<()>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: Session) -> CatResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.id().to_string(), session);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> CatResult<Session> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| CatError::SessionNotFound(session_id.to_string()))
    }

    async fn update(&self, session: Session) -> CatResult<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session.id()) {
            Some(slot) => {
                *slot = session;
                Ok(())
            }
            None => Err(CatError::SessionNotFound(session.id().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multi::MultiSkillModel;

    #[tokio::test]
    async fn get_unknown_session_fails() {
        let store = InMemorySessionStore::new();
        assert_eq!(
            store.get("nope").await.unwrap_err(),
            CatError::SessionNotFound("nope".into())
        );
    }

    #[tokio::test]
    async fn update_requires_existing_session() {
        let store = InMemorySessionStore::new();
        let session = Session::start("s1", MultiSkillModel::new(), 3);
        assert!(store.update(session.clone()).await.is_err());
        store.create(session.clone()).await.unwrap();
        store.update(session).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert!(store.get("s1").await.unwrap().is_finished());
    }
}
