// portal-server/src/session.rs
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use common::models::{CurrentUser, ProjectMember, SessionSnapshot};
use common::GuardError;
use serde::Serialize;
use uuid::Uuid;

use crate::backend::RegistryApi;

/// Ticket identifying one navigation on a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigationToken(u64);

/// Monotonic navigation counter; only the latest token is current.
#[derive(Debug, Default)]
pub struct NavigationSequencer {
    latest: AtomicU64,
}

impl NavigationSequencer {
    pub fn begin(&self) -> NavigationToken {
        NavigationToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: NavigationToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }
}

#[derive(Debug)]
struct SessionState {
    user: Option<CurrentUser>,
    project_members: Vec<ProjectMember>,
    last_active: DateTime<Utc>,
}

/// Client-side record of one browser's console session.
///
/// Holds the cached current user and the member list of the project being
/// navigated. Guards receive it explicitly; nothing here is global.
pub struct SessionContext {
    id: Uuid,
    api: Arc<dyn RegistryApi>,
    state: Mutex<SessionState>,
    sequencer: NavigationSequencer,
    created_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(api: Arc<dyn RegistryApi>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            api,
            state: Mutex::new(SessionState {
                user: None,
                project_members: Vec::new(),
                last_active: now,
            }),
            sequencer: NavigationSequencer::default(),
            created_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn api(&self) -> &dyn RegistryApi {
        self.api.as_ref()
    }

    pub fn sequencer(&self) -> &NavigationSequencer {
        &self.sequencer
    }

    // Never held across an await
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached user only; never contacts the backend.
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.state().user.clone()
    }

    /// Fetch the current identity and cache it.
    ///
    /// Any failure clears the cached user and reports `Unauthenticated`.
    pub async fn retrieve_user(&self) -> Result<CurrentUser, GuardError> {
        match self.api.current_user().await {
            Ok(user) => {
                tracing::debug!("Session {} resolved user {}", self.id, user.username);
                self.state().user = Some(user.clone());
                Ok(user)
            },
            Err(e) => {
                tracing::debug!("Session {} has no authenticated user: {}", self.id, e);
                self.state().user = None;
                Err(GuardError::Unauthenticated)
            }
        }
    }

    pub fn clear(&self) {
        let mut state = self.state();
        state.user = None;
        state.project_members.clear();
    }

    /// Replace the cached member list wholesale.
    pub fn set_project_members(&self, members: Vec<ProjectMember>) {
        self.state().project_members = members;
    }

    pub fn project_members(&self) -> Vec<ProjectMember> {
        self.state().project_members.clone()
    }

    /// End the session on the backend. The local cache is left untouched.
    pub async fn sign_off(&self) -> Result<(), GuardError> {
        self.api.sign_out().await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            user: state.user.clone(),
            project_members: state.project_members.clone(),
        }
    }

    pub fn update_activity(&self) {
        self.state().last_active = Utc::now();
    }

    pub fn is_expired(&self, ttl_seconds: i64) -> bool {
        let age = Utc::now().signed_duration_since(self.state().last_active);
        age.num_seconds() > ttl_seconds
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{user, FakeRegistryApi};

    #[tokio::test]
    async fn retrieve_user_caches_identity() {
        let api = FakeRegistryApi::new().with_user(user(3, "alice", false));
        let session = SessionContext::new(Arc::new(api.clone()));

        assert!(session.current_user().is_none());
        let fetched = session.retrieve_user().await.expect("user");
        assert_eq!(fetched.username, "alice");
        assert_eq!(session.current_user(), Some(fetched));
        assert_eq!(api.current_user_calls(), 1);
    }

    #[tokio::test]
    async fn failed_retrieval_drops_cached_user() {
        let api = FakeRegistryApi::new().with_user(user(3, "alice", false));
        let session = SessionContext::new(Arc::new(api.clone()));
        session.retrieve_user().await.expect("user");

        api.sign_out_backend();
        let result = session.retrieve_user().await;
        assert_eq!(result, Err(GuardError::Unauthenticated));
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn sign_off_leaves_cache_alone() {
        let api = FakeRegistryApi::new().with_user(user(3, "alice", false));
        let session = SessionContext::new(Arc::new(api));
        session.retrieve_user().await.expect("user");

        session.sign_off().await.expect("sign out");
        assert!(session.current_user().is_some());

        session.clear();
        assert!(session.current_user().is_none());
        assert!(session.project_members().is_empty());
    }

    #[test]
    fn only_latest_navigation_is_current() {
        let sequencer = NavigationSequencer::default();
        let first = sequencer.begin();
        assert!(sequencer.is_current(first));

        let second = sequencer.begin();
        assert!(!sequencer.is_current(first));
        assert!(sequencer.is_current(second));
    }

    #[test]
    fn fresh_session_is_not_expired() {
        let session = SessionContext::new(Arc::new(FakeRegistryApi::new()));
        assert!(!session.is_expired(60));
        assert!(session.is_expired(-1));
    }
}
