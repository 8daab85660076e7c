// src/runner/registry.rs

use std::collections::HashMap;

use chrono::{Duration, Utc};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::runner::session::QuizSession;

/// Open quiz sessions, one per quiz page visit.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, QuizSession>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: Duration::try_seconds(ttl_secs)
                .unwrap_or(if ttl_secs < 0 { Duration::MIN } else { Duration::MAX }),
        }
    }

    /// Stores a session, evicting ones idle for longer than the TTL.
    pub async fn insert(&self, session: QuizSession) -> Uuid {
        let id = session.id();
        let mut sessions = self.sessions.lock().await;

        // cutoff out of range: nothing is evicted
        if let Some(cutoff) = Utc::now().checked_sub_signed(self.ttl) {
            let before = sessions.len();
            sessions.retain(|_, s| s.last_active() >= cutoff);
            let evicted = before - sessions.len();
            if evicted > 0 {
                tracing::info!("Evicted {} idle quiz sessions", evicted);
            }
        }
        sessions.insert(id, session);
        id
    }

    /// Locks the registry; look the session up on the guard.
    pub async fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, QuizSession>> {
        self.sessions.lock().await
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.lock().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::data::QuestionBank;
    use crate::runner::filter::QuizFilter;
    use crate::store::MemoryStore;

    async fn session(store: &MemoryStore) -> QuizSession {
        let mut rng = StdRng::seed_from_u64(0);
        QuizSession::open(Arc::new(QuestionBank::default()), store, QuizFilter::default(), &mut rng)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted_on_insert() {
        let store = MemoryStore::new();
        let registry = SessionRegistry::new(-1);

        let first = registry.insert(session(&store).await).await;
        let second = registry.insert(session(&store).await).await;

        let sessions = registry.lock().await;
        assert!(!sessions.contains_key(&first));
        assert!(sessions.contains_key(&second));
    }

    #[tokio::test]
    async fn huge_ttl_keeps_sessions_without_overflow() {
        let store = MemoryStore::new();
        let registry = SessionRegistry::new(i64::MAX);

        let first = registry.insert(session(&store).await).await;
        let second = registry.insert(session(&store).await).await;

        let sessions = registry.lock().await;
        assert!(sessions.contains_key(&first));
        assert!(sessions.contains_key(&second));
    }

    #[tokio::test]
    async fn remove_reports_whether_session_existed() {
        let store = MemoryStore::new();
        let registry = SessionRegistry::new(3600);
        let id = registry.insert(session(&store).await).await;

        assert_eq!(registry.len().await, 1);
        assert!(registry.remove(&id).await);
        assert!(!registry.remove(&id).await);
    }
}
