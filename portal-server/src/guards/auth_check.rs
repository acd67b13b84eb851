// portal-server/src/guards/auth_check.rs
use std::sync::OnceLock;

use async_trait::async_trait;
use common::{CommonRoutes, Decision};
use regex::Regex;

use super::{sign_in_redirect, Guard, GuardContext, GuardSettings};

static GUEST_PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();

fn guest_patterns() -> &'static [Regex; 2] {
    GUEST_PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?i)/harbor/projects/\d+/.+").expect("project browsing pattern"),
            Regex::new(r"(?i)/harbor/tags/\d+/.+").expect("tag browsing pattern"),
        ]
    })
}

/// Repository and tag browsing paths that anonymous users may open.
pub fn is_guest_path(url: &str) -> bool {
    guest_patterns().iter().any(|re| re.is_match(url))
}

/// Gate on the authenticated area; runs for every child navigation.
#[derive(Debug, Clone)]
pub struct AuthCheckGuard {
    settings: GuardSettings,
}

impl AuthCheckGuard {
    pub fn new(settings: GuardSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Guard for AuthCheckGuard {
    fn name(&self) -> &'static str {
        "auth-check"
    }

    async fn can_activate(&self, cx: &GuardContext<'_>) -> Decision {
        cx.notifier.clear_messages();
        if self.settings.read_only {
            cx.notifier.warn_read_only();
        }
        cx.notifier.close_search();

        if cx.session.current_user().is_some() {
            return Decision::Allow;
        }

        let url = cx.navigation.url.as_str();
        match cx.session.retrieve_user().await {
            Ok(_) => Decision::Allow,
            Err(_) if is_guest_path(url) => {
                tracing::debug!("Anonymous browsing of {}", url);
                Decision::Allow
            },
            // The root and sign-in routes are open to anonymous users
            Err(_) if url == CommonRoutes::HARBOR_ROOT
                || url.starts_with(CommonRoutes::EMBEDDED_SIGN_IN) => Decision::Allow,
            Err(_) => {
                tracing::info!("No session for {}, redirecting to sign-in", url);
                sign_in_redirect(url)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guards::{Navigation, NoticeBuffer};
    use crate::session::SessionContext;
    use crate::test_support::{user, FakeRegistryApi};
    use common::{Notice, Redirect, REDIRECT_URL_PARAM};
    use rstest::rstest;
    use std::sync::Arc;

    async fn evaluate(api: FakeRegistryApi, target: &str, settings: GuardSettings) -> (Decision, Vec<Notice>) {
        let session = SessionContext::new(Arc::new(api));
        let navigation = Navigation::parse(target).expect("navigation");
        let notices = NoticeBuffer::default();
        let cx = GuardContext {
            session: &session,
            navigation: &navigation,
            notifier: &notices,
        };
        let decision = AuthCheckGuard::new(settings).can_activate(&cx).await;
        (decision, notices.take())
    }

    #[rstest]
    #[case("/harbor/projects/5/repositories/library%2Fnginx")]
    #[case("/harbor/projects/12/members")]
    #[case("/harbor/tags/3/busybox")]
    #[case("/HARBOR/Projects/5/repositories")]
    fn guest_paths_match(#[case] url: &str) {
        assert!(is_guest_path(url));
    }

    #[rstest]
    #[case("/harbor/projects")]
    #[case("/harbor/projects/5")]
    #[case("/harbor/projects/abc/members")]
    #[case("/harbor/users")]
    #[case("/harbor/tags/3")]
    fn other_paths_do_not_match(#[case] url: &str) {
        assert!(!is_guest_path(url));
    }

    #[rstest]
    #[case("/harbor/projects/5/repositories/x")]
    #[case("/harbor/tags/9/alpine")]
    #[tokio::test]
    async fn anonymous_guest_browsing_is_allowed(#[case] target: &str) {
        let (decision, _) = evaluate(FakeRegistryApi::new(), target, GuardSettings::default()).await;
        assert_eq!(decision, Decision::Allow);
    }

    #[rstest]
    #[case("/harbor/users")]
    #[case("/harbor/projects")]
    #[case("/harbor/projects/5")]
    #[case("/harbor/logs?page=2")]
    #[tokio::test]
    async fn anonymous_access_redirects_to_sign_in(#[case] target: &str) {
        let (decision, _) = evaluate(FakeRegistryApi::new(), target, GuardSettings::default()).await;
        let expected = Redirect::to(CommonRoutes::EMBEDDED_SIGN_IN).with_query(REDIRECT_URL_PARAM, target);
        assert_eq!(decision, Decision::DenyRedirect(expected));
    }

    #[rstest]
    #[case("/harbor")]
    #[case("/harbor/sign-in")]
    #[case("/harbor/sign-in?redirect_url=%2Fharbor%2Fusers")]
    #[tokio::test]
    async fn root_and_sign_in_stay_open(#[case] target: &str) {
        let (decision, _) = evaluate(FakeRegistryApi::new(), target, GuardSettings::default()).await;
        assert_eq!(decision, Decision::Allow);
    }

    #[tokio::test]
    async fn cached_user_skips_backend() {
        let api = FakeRegistryApi::new().with_user(user(1, "alice", false));
        let session = SessionContext::new(Arc::new(api.clone()));
        session.retrieve_user().await.expect("user");

        let navigation = Navigation::parse("/harbor/users").expect("navigation");
        let notices = NoticeBuffer::default();
        let cx = GuardContext { session: &session, navigation: &navigation, notifier: &notices };
        let decision = AuthCheckGuard::new(GuardSettings::default()).can_activate(&cx).await;

        assert_eq!(decision, Decision::Allow);
        assert_eq!(api.current_user_calls(), 1);
    }

    #[tokio::test]
    async fn read_only_backend_warns_without_denying() {
        let api = FakeRegistryApi::new().with_user(user(1, "alice", false));
        let settings = GuardSettings { read_only: true, ..GuardSettings::default() };
        let (decision, notices) = evaluate(api, "/harbor/projects", settings).await;

        assert_eq!(decision, Decision::Allow);
        assert_eq!(notices, vec![Notice::ClearMessages, Notice::ReadOnly, Notice::CloseSearch]);
    }
}
