// ============================
// passgate-lib/src/auth/session.rs
// ============================
//! Login session registry.
//!
//! Tokens themselves are stateless. The registry remembers which refresh
//! tokens are still honoured, keyed by the refresh token's `jti`, so that
//! logout and account deletion can revoke them before they expire.
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use metrics::gauge;
use passgate_common::{SessionInfo, Subject};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::clock::Clock;
use crate::metrics as metric_names;

/// How often the background task sweeps expired sessions
pub const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Session information
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: Uuid,
    pub subject: Subject,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl SessionRecord {
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            subject: self.subject.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Registry of live refresh-token sessions
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<Uuid, SessionRecord>>,
    clock: Arc<dyn Clock>,
}

impl SessionRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            clock,
        }
    }

    /// Remember a session
    pub fn record(&self, session: SessionRecord) {
        self.sessions.insert(session.id, session);
        self.update_gauge();
    }

    /// Whether `id` is a live session owned by `subject`
    pub fn contains(&self, id: Uuid, subject: &Subject) -> bool {
        let now = self.clock.now();
        self.sessions
            .get(&id)
            .map(|s| s.subject == *subject && now < s.expires_at)
            .unwrap_or(false)
    }

    /// Live sessions of `subject`, newest first
    pub fn list(&self, subject: &Subject) -> Vec<SessionInfo> {
        let now = self.clock.now();
        let mut sessions: Vec<SessionInfo> = self
            .sessions
            .iter()
            .filter(|s| s.subject == *subject && now < s.expires_at)
            .map(|s| s.info())
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions
    }

    /// Revoke one session owned by `subject`. Returns whether one was removed.
    pub fn revoke(&self, id: Uuid, subject: &Subject) -> bool {
        let removed = self
            .sessions
            .remove_if(&id, |_, s| s.subject == *subject)
            .is_some();
        if removed {
            self.update_gauge();
        }
        removed
    }

    /// Revoke every session of `subject`. Returns how many were removed.
    pub fn revoke_all(&self, subject: &Subject) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.subject != *subject);
        let removed = before.saturating_sub(self.sessions.len());
        self.update_gauge();
        removed
    }

    /// Drop expired sessions. Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| now < s.expires_at);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::debug!(removed, "pruned expired sessions");
            self.update_gauge();
        }
        removed
    }

    /// Prune expired sessions every `period` on the current runtime.
    ///
    /// The task holds only a weak reference and ends once every clone of the
    /// registry is dropped.
    pub fn spawn_cleanup(&self, period: Duration) -> JoinHandle<()> {
        let sessions = Arc::downgrade(&self.sessions);
        let clock = self.clock.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // the first tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(sessions) = sessions.upgrade() else {
                    break;
                };
                SessionRegistry {
                    sessions,
                    clock: clock.clone(),
                }
                .prune_expired();
            }
            tracing::debug!("session cleanup task stopped");
        })
    }

    /// Number of stored sessions, expired ones included until pruned
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn update_gauge(&self) {
        gauge!(metric_names::SESSIONS_ACTIVE).set(self.sessions.len() as f64);
    }
}
