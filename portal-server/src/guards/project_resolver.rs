// portal-server/src/guards/project_resolver.rs
use common::models::ResolvedProject;
use common::{CommonRoutes, Redirect, PROJECT_ID_PARAM};

use super::Navigation;
use crate::session::SessionContext;

/// Result of resolving a project before a route activates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    Resolved(ResolvedProject),
    /// Lookup failed; navigation continues at the project list instead
    Fallback(Redirect),
}

/// Loads the routed project and annotates it with the caller's access.
///
/// One-shot: a failed lookup redirects, it is never retried.
#[derive(Debug, Clone, Default)]
pub struct ProjectResolver;

impl ProjectResolver {
    pub fn new() -> Self {
        Self
    }

    pub async fn resolve(&self, session: &SessionContext, navigation: &Navigation) -> ResolveOutcome {
        let raw_id = navigation
            .param("id")
            .or_else(|| navigation.query_param(PROJECT_ID_PARAM));
        let Some(project_id) = raw_id.and_then(|id| id.parse::<i64>().ok()) else {
            tracing::warn!("Cannot resolve a project from {}", navigation.url);
            return Self::fallback();
        };

        match session.api().project(project_id).await {
            Ok(project) => {
                // Read the user now; derived fields describe this user only
                let user = session.current_user();
                ResolveOutcome::Resolved(ResolvedProject::resolve(project, user.as_ref()))
            },
            Err(e) => {
                tracing::warn!("Failed to resolve project {}: {}", project_id, e);
                Self::fallback()
            }
        }
    }

    fn fallback() -> ResolveOutcome {
        ResolveOutcome::Fallback(Redirect::to(CommonRoutes::PROJECT_LIST))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{project, user, FakeRegistryApi};
    use common::models::{Role, SYSTEM_ADMIN_LABEL};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn routed(target: &str, id: Option<&str>) -> Navigation {
        let navigation = Navigation::parse(target).expect("navigation");
        match id {
            Some(id) => navigation.with_params(HashMap::from([("id".to_string(), id.to_string())])),
            None => navigation,
        }
    }

    async fn signed_in(api: FakeRegistryApi) -> SessionContext {
        let session = SessionContext::new(Arc::new(api));
        session.retrieve_user().await.expect("user");
        session
    }

    #[tokio::test]
    async fn developer_gets_developer_access() {
        let api = FakeRegistryApi::new()
            .with_user(user(2, "alice", false))
            .with_project(project(7, false, Role::DEVELOPER_ID));
        let session = signed_in(api).await;

        let outcome = ProjectResolver::new().resolve(&session, &routed("/harbor/projects/7", Some("7"))).await;
        let ResolveOutcome::Resolved(resolved) = outcome else {
            panic!("expected a resolved project");
        };
        assert!(!resolved.has_project_admin_role);
        assert!(resolved.is_member);
        assert_eq!(resolved.role_name.as_deref(), Some("developer"));
    }

    #[tokio::test]
    async fn administrator_overrides_project_role() {
        let api = FakeRegistryApi::new()
            .with_user(user(1, "admin", true))
            .with_project(project(7, false, 0));
        let session = signed_in(api).await;

        let outcome = ProjectResolver::new().resolve(&session, &routed("/harbor/projects/7", Some("7"))).await;
        let ResolveOutcome::Resolved(resolved) = outcome else {
            panic!("expected a resolved project");
        };
        assert!(resolved.has_project_admin_role);
        assert!(resolved.is_member);
        assert_eq!(resolved.role_name.as_deref(), Some(SYSTEM_ADMIN_LABEL));
    }

    #[tokio::test]
    async fn query_parameter_is_a_fallback_id() {
        let api = FakeRegistryApi::new()
            .with_user(user(2, "alice", false))
            .with_project(project(9, true, Role::GUEST_ID));
        let session = signed_in(api).await;

        let outcome = ProjectResolver::new()
            .resolve(&session, &routed("/harbor/replications?project_id=9", None))
            .await;
        assert!(matches!(outcome, ResolveOutcome::Resolved(ref p) if p.project.id == 9));
    }

    #[tokio::test]
    async fn missing_project_falls_back_to_project_list() {
        let session = signed_in(FakeRegistryApi::new().with_user(user(2, "alice", false))).await;

        let outcome = ProjectResolver::new().resolve(&session, &routed("/harbor/projects/404", Some("404"))).await;
        assert_eq!(outcome, ResolveOutcome::Fallback(Redirect::to(CommonRoutes::PROJECT_LIST)));
    }

    #[tokio::test]
    async fn backend_failure_falls_back_to_project_list() {
        let api = FakeRegistryApi::new()
            .with_user(user(2, "alice", false))
            .with_unreachable_projects();
        let session = signed_in(api).await;

        let outcome = ProjectResolver::new().resolve(&session, &routed("/harbor/projects/7", Some("7"))).await;
        assert_eq!(outcome, ResolveOutcome::Fallback(Redirect::to(CommonRoutes::PROJECT_LIST)));
    }

    #[tokio::test]
    async fn unparsable_id_falls_back_without_backend_call() {
        let api = FakeRegistryApi::new().with_user(user(2, "alice", false));
        let session = signed_in(api.clone()).await;

        let outcome = ProjectResolver::new().resolve(&session, &routed("/harbor/projects/x", Some("x"))).await;
        assert!(matches!(outcome, ResolveOutcome::Fallback(_)));
        assert_eq!(api.calls().len(), 1);
    }
}
