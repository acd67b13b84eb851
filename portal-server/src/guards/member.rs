// portal-server/src/guards/member.rs
use async_trait::async_trait;
use common::Decision;

use super::{Guard, GuardContext, GuardSettings};
use crate::session::SessionContext;

/// Gate on project-scoped routes: members pass, and so does anyone for a
/// public project.
///
/// Administrators are not special-cased here; the backend lists their
/// membership and the project resolver grants them full access.
#[derive(Debug, Clone)]
pub struct MemberGuard {
    settings: GuardSettings,
}

impl MemberGuard {
    pub fn new(settings: GuardSettings) -> Self {
        Self { settings }
    }

    /// Cache the member list when visible, else fall back to the project's
    /// public flag.
    pub async fn check_member_status(&self, session: &SessionContext, project_id: i64) -> Decision {
        match session.api().project_members(project_id).await {
            Ok(members) => {
                tracing::debug!("Project {} lists {} members", project_id, members.len());
                session.set_project_members(members);
                Decision::Allow
            },
            Err(e) => {
                tracing::debug!("Membership check failed for project {}: {}", project_id, e);
                self.public_fallback(session, project_id).await
            }
        }
    }

    async fn public_fallback(&self, session: &SessionContext, project_id: i64) -> Decision {
        match session.api().project(project_id).await {
            Ok(project) if project.public => Decision::Allow,
            Ok(_) => {
                tracing::info!("Project {} is private, leaving", project_id);
                self.settings.landing()
            },
            Err(e) => {
                tracing::warn!("Failed to load project {}: {}", project_id, e);
                self.settings.landing()
            }
        }
    }
}

#[async_trait]
impl Guard for MemberGuard {
    fn name(&self) -> &'static str {
        "member"
    }

    async fn can_activate(&self, cx: &GuardContext<'_>) -> Decision {
        // Never show the previous project's members while resolving
        cx.session.set_project_members(Vec::new());

        let project_id = match cx.navigation.param("id").map(str::parse::<i64>) {
            Some(Ok(id)) => id,
            _ => {
                tracing::warn!("No usable project id in {}", cx.navigation.url);
                return self.settings.landing();
            }
        };

        if cx.session.current_user().is_none() && cx.session.retrieve_user().await.is_err() {
            // Anonymous visitors only get through for public projects
            return self.public_fallback(cx.session, project_id).await;
        }

        self.check_member_status(cx.session, project_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guards::{Navigation, NoticeBuffer};
    use crate::test_support::{member, project, user, ApiCall, FakeRegistryApi};
    use common::{CommonRoutes, Redirect};
    use std::collections::HashMap;
    use std::sync::Arc;

    async fn evaluate(session: &SessionContext, target: &str, id: &str) -> Decision {
        let params = HashMap::from([("id".to_string(), id.to_string())]);
        let navigation = Navigation::parse(target).expect("navigation").with_params(params);
        let notices = NoticeBuffer::default();
        let cx = GuardContext { session, navigation: &navigation, notifier: &notices };
        MemberGuard::new(GuardSettings::default()).can_activate(&cx).await
    }

    fn landing() -> Decision {
        Decision::redirect(Redirect::to(CommonRoutes::HARBOR_DEFAULT))
    }

    #[tokio::test]
    async fn member_list_is_cached_for_members() {
        let api = FakeRegistryApi::new()
            .with_user(user(1, "alice", false))
            .with_members(4, vec![member(10, 4, "alice", 2), member(11, 4, "bob", 3)]);
        let session = SessionContext::new(Arc::new(api));

        let decision = evaluate(&session, "/harbor/projects/4/members", "4").await;
        assert_eq!(decision, Decision::Allow);
        assert_eq!(session.project_members().len(), 2);
    }

    #[tokio::test]
    async fn public_project_admits_non_members() {
        let api = FakeRegistryApi::new()
            .with_user(user(1, "alice", false))
            .with_project(project(5, true, 0));
        let session = SessionContext::new(Arc::new(api));

        assert_eq!(evaluate(&session, "/harbor/projects/5", "5").await, Decision::Allow);
        assert!(session.project_members().is_empty());
    }

    #[tokio::test]
    async fn private_project_sends_non_members_to_landing() {
        let api = FakeRegistryApi::new()
            .with_user(user(1, "alice", false))
            .with_project(project(6, false, 0));
        let session = SessionContext::new(Arc::new(api));

        assert_eq!(evaluate(&session, "/harbor/projects/6", "6").await, landing());
    }

    #[tokio::test]
    async fn unreachable_project_sends_non_members_to_landing() {
        let api = FakeRegistryApi::new()
            .with_user(user(1, "alice", false))
            .with_unreachable_projects();
        let session = SessionContext::new(Arc::new(api));

        assert_eq!(evaluate(&session, "/harbor/projects/6", "6").await, landing());
    }

    #[tokio::test]
    async fn member_list_is_reset_for_every_evaluation() {
        let api = FakeRegistryApi::new()
            .with_user(user(1, "alice", false))
            .with_members(4, vec![member(10, 4, "alice", 2)])
            .with_project(project(5, true, 0));
        let session = SessionContext::new(Arc::new(api));

        evaluate(&session, "/harbor/projects/4", "4").await;
        assert_eq!(session.project_members().len(), 1);

        // Project 5 hides its members; project 4's list must not linger
        evaluate(&session, "/harbor/projects/5", "5").await;
        assert!(session.project_members().is_empty());

        // Repeating the same project resets and refills
        evaluate(&session, "/harbor/projects/4", "4").await;
        evaluate(&session, "/harbor/projects/4", "4").await;
        assert_eq!(session.project_members().len(), 1);
    }

    #[tokio::test]
    async fn anonymous_visitor_reaches_public_project() {
        let api = FakeRegistryApi::new().with_project(project(5, true, 0));
        let session = SessionContext::new(Arc::new(api.clone()));

        let decision = evaluate(&session, "/harbor/projects/5/repositories/x", "5").await;
        assert_eq!(decision, Decision::Allow);
        assert!(!api.calls().contains(&ApiCall::ProjectMembers(5)));
    }

    #[tokio::test]
    async fn anonymous_visitor_is_sent_away_from_private_project() {
        let api = FakeRegistryApi::new().with_project(project(6, false, 0));
        let session = SessionContext::new(Arc::new(api));

        assert_eq!(evaluate(&session, "/harbor/projects/6", "6").await, landing());
    }

    #[tokio::test]
    async fn malformed_project_id_is_rejected() {
        let api = FakeRegistryApi::new().with_user(user(1, "alice", false));
        let session = SessionContext::new(Arc::new(api.clone()));
        session.set_project_members(vec![member(1, 1, "alice", 1)]);

        assert_eq!(evaluate(&session, "/harbor/projects/abc", "abc").await, landing());
        assert!(session.project_members().is_empty());
        assert!(api.calls().is_empty());
    }
}
