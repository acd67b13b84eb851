// portal-server/src/test_support.rs
//! In-memory registry backend for guard and gateway tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use common::models::{CurrentUser, Project, ProjectMember};
use common::GuardError;

use crate::backend::{ApiFactory, RegistryApi};

/// A backend call observed by [`FakeRegistryApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    CurrentUser,
    SignOut,
    Project(i64),
    ProjectMembers(i64),
}

#[derive(Debug, Default)]
struct FakeState {
    user: Option<CurrentUser>,
    sign_out_fails: bool,
    projects: HashMap<i64, Project>,
    members: HashMap<i64, Vec<ProjectMember>>,
    project_lookup_fails: bool,
    user_delay: Option<Duration>,
    calls: Vec<ApiCall>,
}

/// Recording fake of the backend; clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeRegistryApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeRegistryApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake backend lock")
    }

    pub fn with_user(self, user: CurrentUser) -> Self {
        self.state().user = Some(user);
        self
    }

    pub fn with_project(self, project: Project) -> Self {
        self.state().projects.insert(project.id, project);
        self
    }

    /// Grant visibility of the project's member list.
    pub fn with_members(self, project_id: i64, members: Vec<ProjectMember>) -> Self {
        self.state().members.insert(project_id, members);
        self
    }

    pub fn with_failing_sign_out(self) -> Self {
        self.state().sign_out_fails = true;
        self
    }

    /// Every project lookup fails with a transport error.
    pub fn with_unreachable_projects(self) -> Self {
        self.state().project_lookup_fails = true;
        self
    }

    /// Delay identity lookups to interleave concurrent navigations.
    pub fn with_user_delay(self, delay: Duration) -> Self {
        self.state().user_delay = Some(delay);
        self
    }

    /// Drop the backend session, as an expiry or sign-out elsewhere would.
    pub fn sign_out_backend(&self) {
        self.state().user = None;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    pub fn current_user_calls(&self) -> usize {
        self.calls().iter().filter(|c| **c == ApiCall::CurrentUser).count()
    }

    fn record(&self, call: ApiCall) {
        self.state().calls.push(call);
    }
}

#[async_trait]
impl RegistryApi for FakeRegistryApi {
    async fn current_user(&self) -> Result<CurrentUser, GuardError> {
        self.record(ApiCall::CurrentUser);
        let delay = self.state().user_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state().user.clone().ok_or(GuardError::Unauthenticated)
    }

    async fn sign_out(&self) -> Result<(), GuardError> {
        self.record(ApiCall::SignOut);
        let mut state = self.state();
        if state.sign_out_fails {
            return Err(GuardError::Transport("connection refused".to_string()));
        }
        state.user = None;
        Ok(())
    }

    async fn project(&self, project_id: i64) -> Result<Project, GuardError> {
        self.record(ApiCall::Project(project_id));
        let state = self.state();
        if state.project_lookup_fails {
            return Err(GuardError::Transport("connection refused".to_string()));
        }
        state
            .projects
            .get(&project_id)
            .cloned()
            .ok_or(GuardError::ProjectNotFound { project_id })
    }

    async fn project_members(&self, project_id: i64) -> Result<Vec<ProjectMember>, GuardError> {
        self.record(ApiCall::ProjectMembers(project_id));
        self.state()
            .members
            .get(&project_id)
            .cloned()
            .ok_or(GuardError::NotAMember { project_id })
    }
}

impl ApiFactory for FakeRegistryApi {
    fn for_session(&self, _session_cookie: Option<&str>) -> Arc<dyn RegistryApi> {
        Arc::new(self.clone())
    }
}

pub fn user(id: i64, username: &str, admin: bool) -> CurrentUser {
    CurrentUser {
        id,
        username: username.to_string(),
        admin,
    }
}

pub fn project(id: i64, public: bool, current_user_role_id: i64) -> Project {
    Project {
        id,
        name: format!("project-{}", id),
        public,
        current_user_role_id,
    }
}

pub fn member(id: i64, project_id: i64, name: &str, role_id: i64) -> ProjectMember {
    ProjectMember {
        id,
        project_id,
        entity_name: name.to_string(),
        entity_type: "u".to_string(),
        role_id,
    }
}
