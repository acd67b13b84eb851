// portal-server/src/guards/mod.rs
pub mod auth_check;
pub mod member;
pub mod project_resolver;
pub mod sign_in;
pub mod system_admin;

pub use auth_check::AuthCheckGuard;
pub use member::MemberGuard;
pub use project_resolver::{ProjectResolver, ResolveOutcome};
pub use sign_in::SignInGuard;
pub use system_admin::SystemAdminGuard;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use common::{CommonRoutes, Config, Decision, Notice, Redirect, REDIRECT_URL_PARAM};
use url::Url;

use crate::session::SessionContext;

// Only used to give relative console urls an origin for parsing
const PARSE_BASE: &str = "http://console.invalid";

/// A navigation target: the url plus the route parameters it matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Path and query, as the browser asked for it
    pub url: String,
    pub path: String,
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
}

impl Navigation {
    pub fn parse(target: &str) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(PARSE_BASE)?.join(target)?;
        let path = parsed.path().to_string();
        let url = match parsed.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path.clone(),
        };
        let query = parsed.query_pairs().into_owned().collect();

        Ok(Self {
            url,
            path,
            params: HashMap::new(),
            query,
        })
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// UI collaborator for the auth check's side effects.
pub trait ConsoleNotifier: Send + Sync {
    fn clear_messages(&self);
    fn close_search(&self);
    fn warn_read_only(&self);
}

/// Collects notices so the HTTP layer can hand them to the browser.
#[derive(Debug, Default)]
pub struct NoticeBuffer {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeBuffer {
    fn push(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }

    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl ConsoleNotifier for NoticeBuffer {
    fn clear_messages(&self) {
        self.push(Notice::ClearMessages);
    }

    fn close_search(&self) {
        self.push(Notice::CloseSearch);
    }

    fn warn_read_only(&self) {
        self.push(Notice::ReadOnly);
    }
}

/// Externally supplied settings every guard reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardSettings {
    pub read_only: bool,
    pub default_landing: String,
}

impl GuardSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            read_only: config.read_only,
            default_landing: config.routes.default_landing.clone(),
        }
    }

    pub fn landing(&self) -> Decision {
        Decision::redirect(Redirect::to(self.default_landing.clone()))
    }
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            read_only: false,
            default_landing: CommonRoutes::HARBOR_DEFAULT.to_string(),
        }
    }
}

/// Redirect to the embedded sign-in page, remembering where the user was going.
pub fn sign_in_redirect(target: &str) -> Decision {
    Decision::redirect(
        Redirect::to(CommonRoutes::EMBEDDED_SIGN_IN).with_query(REDIRECT_URL_PARAM, target),
    )
}

/// Everything a guard sees for one evaluation.
pub struct GuardContext<'a> {
    pub session: &'a SessionContext,
    pub navigation: &'a Navigation,
    pub notifier: &'a dyn ConsoleNotifier,
}

/// A predicate evaluated before a navigation is permitted.
///
/// Guards settle every backend failure themselves; the router only ever
/// sees a [`Decision`].
#[async_trait]
pub trait Guard: Send + Sync {
    fn name(&self) -> &'static str;

    async fn can_activate(&self, cx: &GuardContext<'_>) -> Decision;
}
