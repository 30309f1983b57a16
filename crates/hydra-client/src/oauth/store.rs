//! Per-browser session state: pending authorizations, tokens, logout state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::types::{PendingAuthorization, PendingLogout, Token, UserInfo};

/// Cleanup interval: 5 minutes.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// A logged-in session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: Token,
    pub user: Option<UserInfo>,
}

/// Storage for session state, keyed by an opaque session ID.
///
/// Implementations must be safe to share across request handlers.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Remember an authorization request until its callback arrives.
    async fn begin_authorization(&self, session_id: &str, pending: PendingAuthorization);

    /// Remove and return the pending authorization request.
    async fn take_authorization(&self, session_id: &str) -> Option<PendingAuthorization>;

    /// Store the session established by a successful login.
    async fn save_session(&self, session_id: &str, session: Session);

    /// The current session, if logged in and its token has not expired.
    async fn current_session(&self, session_id: &str) -> Option<Session>;

    /// Remove the session, returning what was held.
    async fn clear_session(&self, session_id: &str) -> Option<Session>;

    /// Remember the state sent with a logout redirect.
    async fn begin_logout(&self, session_id: &str, state: String);

    /// Remove and return the logout state.
    async fn take_logout(&self, session_id: &str) -> Option<String>;
}

/// In-memory session store.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    pending: Arc<RwLock<HashMap<String, PendingAuthorization>>>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    logouts: Arc<RwLock<HashMap<String, PendingLogout>>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of logged-in sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Start background cleanup of abandoned redirects and expired sessions.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                self.cleanup_expired().await;
            }
        });
    }

    async fn cleanup_expired(&self) {
        let authorizations = {
            let mut pending = self.pending.write().await;
            let before = pending.len();
            pending.retain(|_, p| !p.is_expired());
            before - pending.len()
        };
        let logouts = {
            let mut logouts = self.logouts.write().await;
            let before = logouts.len();
            logouts.retain(|_, l| !l.is_expired());
            before - logouts.len()
        };
        let sessions = {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, s| !s.token.is_expired());
            before - sessions.len()
        };

        if authorizations + logouts + sessions > 0 {
            tracing::debug!(authorizations, logouts, sessions, "Cleaned up expired session state");
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn begin_authorization(&self, session_id: &str, pending: PendingAuthorization) {
        self.pending.write().await.insert(session_id.to_owned(), pending);
    }

    async fn take_authorization(&self, session_id: &str) -> Option<PendingAuthorization> {
        let pending = self.pending.write().await.remove(session_id)?;
        if pending.is_expired() {
            return None;
        }
        Some(pending)
    }

    async fn save_session(&self, session_id: &str, session: Session) {
        self.sessions.write().await.insert(session_id.to_owned(), session);
    }

    async fn current_session(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().await.get(session_id).filter(|s| !s.token.is_expired()).cloned()
    }

    async fn clear_session(&self, session_id: &str) -> Option<Session> {
        self.sessions.write().await.remove(session_id)
    }

    async fn begin_logout(&self, session_id: &str, state: String) {
        self.logouts.write().await.insert(session_id.to_owned(), PendingLogout::new(state));
    }

    async fn take_logout(&self, session_id: &str) -> Option<String> {
        let logout = self.logouts.write().await.remove(session_id)?;
        if logout.is_expired() {
            return None;
        }
        Some(logout.state)
    }
}

impl std::fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use chrono::Utc;

    use super::*;
    use crate::oauth::mode::LoginMode;

    fn pending(state: &str) -> PendingAuthorization {
        PendingAuthorization {
            state: state.into(),
            redirect_uri: "https://app.example.com/authorized".into(),
            mode: LoginMode::Login,
            code_verifier: None,
            created_at: Instant::now(),
        }
    }

    fn session() -> Session {
        Session {
            token: Token {
                access_token: "at".into(),
                token_type: "bearer".into(),
                refresh_token: None,
                id_token: Some("idt".into()),
                scope: None,
                expires_at: None,
            },
            user: None,
        }
    }

    #[tokio::test]
    async fn test_pending_authorization_is_single_use() {
        let store = MemorySessionStore::new();
        store.begin_authorization("sid", pending("s1")).await;

        assert_eq!(store.take_authorization("sid").await.unwrap().state, "s1");
        assert!(store.take_authorization("sid").await.is_none());
    }

    #[tokio::test]
    async fn test_new_authorization_replaces_old() {
        let store = MemorySessionStore::new();
        store.begin_authorization("sid", pending("s1")).await;
        store.begin_authorization("sid", pending("s2")).await;

        assert_eq!(store.take_authorization("sid").await.unwrap().state, "s2");
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = MemorySessionStore::new();
        store.save_session("sid", session()).await;
        assert_eq!(store.session_count().await, 1);
        assert!(store.current_session("other").await.is_none());

        let cleared = store.clear_session("sid").await.unwrap();
        assert_eq!(cleared.token.id_token.as_deref(), Some("idt"));
        assert!(store.current_session("sid").await.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_drops_expired() {
        let store = MemorySessionStore::new();
        let mut old = pending("old");
        old.created_at = Instant::now().checked_sub(Duration::from_secs(601)).unwrap();
        store.begin_authorization("a", old).await;
        store.begin_authorization("b", pending("fresh")).await;

        store.cleanup_expired().await;
        assert!(store.take_authorization("a").await.is_none());
        assert!(store.take_authorization("b").await.is_some());
    }

    #[tokio::test]
    async fn test_cleanup_drops_abandoned_logouts() {
        let store = MemorySessionStore::new();
        for i in 0..1000 {
            store.begin_logout(&format!("sid-{i}"), format!("st-{i}")).await;
        }
        store.begin_logout("fresh", "st".into()).await;

        {
            let mut logouts = store.logouts.write().await;
            let aged = Instant::now().checked_sub(Duration::from_secs(601)).unwrap();
            for (id, logout) in logouts.iter_mut() {
                if id != "fresh" {
                    logout.created_at = aged;
                }
            }
        }

        store.cleanup_expired().await;
        assert_eq!(store.logouts.read().await.len(), 1);
        assert_eq!(store.take_logout("fresh").await.as_deref(), Some("st"));
    }

    #[tokio::test]
    async fn test_expired_logout_state_not_returned() {
        let store = MemorySessionStore::new();
        store.begin_logout("sid", "st".into()).await;
        store.logouts.write().await.get_mut("sid").unwrap().created_at =
            Instant::now().checked_sub(Duration::from_secs(601)).unwrap();

        assert!(store.take_logout("sid").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_sessions_hidden_and_pruned() {
        let store = MemorySessionStore::new();
        let mut stale = session();
        stale.token.expires_at = Some(Utc::now() - chrono::Duration::seconds(1));
        store.save_session("stale", stale).await;
        store.save_session("live", session()).await;

        assert!(store.current_session("stale").await.is_none());

        store.cleanup_expired().await;
        assert_eq!(store.session_count().await, 1);
        assert!(store.current_session("live").await.is_some());
    }
}
