// portal-server/src/state.rs
use std::sync::Arc;

use actix_web::HttpRequest;
use common::{CommonRoutes, Config, Notice, StaticFilesConfig, SIGN_OUT_PARAM};

use crate::backend::ApiFactory;
use crate::guards::{GuardSettings, Navigation, NoticeBuffer};
use crate::router::{NavigationOutcome, Navigator};
use crate::session::SessionContext;
use crate::session_registry::SessionRegistry;

/// Shared application state handed to every handler
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub navigator: Navigator,
    pub session_cookie: String,
    pub default_landing: String,
    pub static_files: StaticFilesConfig,
}

impl AppState {
    pub fn new(config: &Config, api: Arc<dyn ApiFactory>) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new(api, &config.session)),
            navigator: Navigator::new(GuardSettings::from_config(config)),
            session_cookie: config.backend.session_cookie.clone(),
            default_landing: config.routes.default_landing.clone(),
            static_files: config.static_files.clone(),
        }
    }

    // Surrounding whitespace is not part of the session id
    fn cookie_value(&self, req: &HttpRequest) -> Option<String> {
        req.cookie(&self.session_cookie)
            .map(|c| c.value().trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub fn session_for(&self, req: &HttpRequest) -> Arc<SessionContext> {
        self.registry.context_for(self.cookie_value(req).as_deref())
    }

    /// Evaluate an in-app navigation; newer navigations on the same session
    /// supersede it.
    pub async fn evaluate(&self, req: &HttpRequest, target: &str) -> (NavigationOutcome, Vec<Notice>) {
        self.run(req, target, true).await
    }

    /// Evaluate a full page load, which is never superseded.
    pub async fn load_page(&self, req: &HttpRequest, target: &str) -> (NavigationOutcome, Vec<Notice>) {
        self.run(req, target, false).await
    }

    async fn run(&self, req: &HttpRequest, target: &str, sequenced: bool) -> (NavigationOutcome, Vec<Notice>) {
        let cookie = self.cookie_value(req);
        let session = self.registry.context_for(cookie.as_deref());
        let notices = NoticeBuffer::default();

        let outcome = if sequenced {
            self.navigator.navigate(&session, target, &notices).await
        } else {
            self.navigator.load(&session, target, &notices).await
        };

        // The sign-in guard has already cleared the context; drop the entry too
        let signing_out = Navigation::parse(target)
            .map(|nav| {
                nav.path == CommonRoutes::EMBEDDED_SIGN_IN
                    && nav.query_param(SIGN_OUT_PARAM).is_some_and(|v| !v.is_empty())
            })
            .unwrap_or(false);
        if let (true, Some(cookie)) = (signing_out, cookie.as_deref()) {
            self.registry.invalidate(cookie);
        }

        (outcome, notices.take())
    }
}
