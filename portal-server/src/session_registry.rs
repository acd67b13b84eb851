// portal-server/src/session_registry.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::SessionConfig;
use dashmap::DashMap;

use crate::backend::ApiFactory;
use crate::session::SessionContext;
use crate::utils::token::fingerprint;

/// Session counts reported by the registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionMetrics {
    pub total_sessions: usize,
    pub authenticated_sessions: usize,
    pub expired_count: usize,
}

/// One [`SessionContext`] per browser session.
///
/// Keyed by a fingerprint of the backend session cookie so raw cookie
/// values never sit in memory as map keys.
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, Arc<SessionContext>>>,
    api: Arc<dyn ApiFactory>,
    // Session TTL in seconds
    session_ttl: i64,
    cleanup_interval: Duration,
    expired_count: AtomicUsize,
}

impl SessionRegistry {
    pub fn new(api: Arc<dyn ApiFactory>, config: &SessionConfig) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            api,
            session_ttl: config.ttl_secs,
            cleanup_interval: Duration::from_secs(config.cleanup_interval_secs.max(1)),
            expired_count: AtomicUsize::new(0),
        }
    }

    /// Context for the browser presenting `cookie`.
    ///
    /// Without a cookie the caller is anonymous and gets a throwaway context.
    pub fn context_for(&self, cookie: Option<&str>) -> Arc<SessionContext> {
        let Some(cookie) = cookie.filter(|c| !c.is_empty()) else {
            return Arc::new(SessionContext::new(self.api.for_session(None)));
        };

        let key = fingerprint(cookie);
        if let Some(entry) = self.sessions.get(&key) {
            if !entry.is_expired(self.session_ttl) {
                entry.update_activity();
                return Arc::clone(entry.value());
            }
        }

        let context = Arc::new(SessionContext::new(self.api.for_session(Some(cookie))));
        tracing::info!("Registered console session {}", context.id());
        self.sessions.insert(key, Arc::clone(&context));
        context
    }

    /// Forget the session bound to `cookie`. Returns whether one existed.
    pub fn invalidate(&self, cookie: &str) -> bool {
        match self.sessions.remove(&fingerprint(cookie)) {
            Some((_, context)) => {
                context.clear();
                tracing::info!("Invalidated console session {}", context.id());
                true
            },
            None => false,
        }
    }

    /// Remove sessions idle for longer than the TTL
    pub fn cleanup_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, context| !context.is_expired(self.session_ttl));
        let expired = before.saturating_sub(self.sessions.len());

        self.expired_count.fetch_add(expired, Ordering::Relaxed);
        expired
    }

    pub fn metrics(&self) -> SessionMetrics {
        let authenticated_sessions = self
            .sessions
            .iter()
            .filter(|entry| entry.value().current_user().is_some())
            .count();

        SessionMetrics {
            total_sessions: self.sessions.len(),
            authenticated_sessions,
            expired_count: self.expired_count.load(Ordering::Relaxed),
        }
    }

    /// Schedule periodic session cleanup on the current runtime.
    pub fn spawn_cleanup(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        tracing::info!(
            "Session cleanup every {}s with TTL {}s",
            registry.cleanup_interval.as_secs(),
            registry.session_ttl
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(registry.cleanup_interval);
            loop {
                interval.tick().await;
                let expired = registry.cleanup_expired();
                if expired > 0 {
                    tracing::info!("Cleaned up {} expired sessions", expired);
                }
            }
        })
    }
}
