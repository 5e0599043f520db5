// src/utils/store.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{error::AppError, models::session::ExamSession};

/// In-memory registry of live sessions.
///
/// Each session is isolated; the lock only guards the map and is never held
/// across an `.await`.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<Uuid, ExamSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, ExamSession>> {
        // A panic while holding the lock leaves plain data behind; keep serving.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, session: ExamSession) -> Uuid {
        let id = session.id;
        self.lock().insert(id, session);
        id
    }

    /// Runs `f` against the session under the lock.
    pub fn with_session<T>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut ExamSession) -> T,
    ) -> Result<T, AppError> {
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound("Session not found or expired".to_string()))?;
        Ok(f(session))
    }

    pub fn remove(&self, id: &Uuid) -> Option<ExamSession> {
        self.lock().remove(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops sessions older than `ttl_secs`. Returns how many were removed.
    pub fn purge_expired(&self, ttl_secs: u64) -> usize {
        let cutoff = Utc::now() - Duration::seconds(ttl_secs as i64);
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| s.created_at > cutoff);
        before - sessions.len()
    }
}
