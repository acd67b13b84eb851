// portal-server/src/router.rs
use std::collections::HashMap;
use std::sync::OnceLock;

use actix_web::dev::{Path, ResourceDef};
use common::models::ResolvedProject;
use common::{CommonRoutes, Decision, Redirect};
use serde::Serialize;

use crate::guards::{
    AuthCheckGuard, ConsoleNotifier, Guard, GuardContext, GuardSettings, MemberGuard, Navigation,
    ProjectResolver, ResolveOutcome, SignInGuard, SystemAdminGuard,
};
use crate::session::{NavigationToken, SessionContext};

/// Per-route guards, run after the auth check in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardKind {
    SignIn,
    Member,
    SystemAdmin,
}

/// One console route.
#[derive(Debug, Clone, Copy)]
pub struct RouteDef {
    pub name: &'static str,
    /// actix resource pattern; `{name}` captures a segment
    pub pattern: &'static str,
    /// Routes under `/harbor` pass the auth check first
    pub auth_check: bool,
    pub guards: &'static [GuardKind],
    pub resolve_project: bool,
    pub redirect_to: Option<&'static str>,
}

const fn route(name: &'static str, pattern: &'static str, guards: &'static [GuardKind]) -> RouteDef {
    RouteDef {
        name,
        pattern,
        auth_check: true,
        guards,
        resolve_project: false,
        redirect_to: None,
    }
}

const fn project_route(name: &'static str, pattern: &'static str) -> RouteDef {
    RouteDef {
        name,
        pattern,
        auth_check: true,
        guards: &[GuardKind::Member],
        resolve_project: true,
        redirect_to: None,
    }
}

const ADMIN: &[GuardKind] = &[GuardKind::SystemAdmin];

pub static CONSOLE_ROUTES: &[RouteDef] = &[
    RouteDef {
        name: "reset-password",
        pattern: "/reset_password",
        auth_check: false,
        guards: &[],
        resolve_project: false,
        redirect_to: None,
    },
    RouteDef {
        name: "root",
        pattern: "/harbor",
        auth_check: true,
        guards: &[],
        resolve_project: false,
        redirect_to: Some(CommonRoutes::EMBEDDED_SIGN_IN),
    },
    route("sign-in", "/harbor/sign-in", &[GuardKind::SignIn]),
    route("projects", "/harbor/projects", &[]),
    route("logs", "/harbor/logs", &[]),
    route("users", "/harbor/users", ADMIN),
    route("groups", "/harbor/groups", ADMIN),
    route("registries", "/harbor/registries", ADMIN),
    route("replications", "/harbor/replications", ADMIN),
    route("configs", "/harbor/configs", ADMIN),
    route("registry", "/harbor/registry", ADMIN),
    project_route("tag-repository", "/harbor/tags/{id}/{repo}"),
    project_route("repository", "/harbor/projects/{id}/repositories/{repo}"),
    project_route("tag-detail", "/harbor/projects/{id}/repositories/{repo}/tags/{tag}"),
    project_route("chart-versions", "/harbor/projects/{id}/helm-charts/{chart}/versions"),
    project_route("chart-detail", "/harbor/projects/{id}/helm-charts/{chart}/versions/{version}"),
    project_route("project-detail", "/harbor/projects/{id}"),
    project_route("project-repositories", "/harbor/projects/{id}/repositories"),
    project_route("project-charts", "/harbor/projects/{id}/helm-charts"),
    project_route("project-repository-tags", "/harbor/projects/{id}/repositories/{repo}/tags"),
    project_route("project-replications", "/harbor/projects/{id}/replications"),
    project_route("project-members", "/harbor/projects/{id}/members"),
    project_route("project-logs", "/harbor/projects/{id}/logs"),
    project_route("project-labels", "/harbor/projects/{id}/labels"),
    project_route("project-configs", "/harbor/projects/{id}/configs"),
];

static RESOURCES: OnceLock<Vec<ResourceDef>> = OnceLock::new();

// Compiled once, index-aligned with CONSOLE_ROUTES
fn resources() -> &'static [ResourceDef] {
    RESOURCES.get_or_init(|| CONSOLE_ROUTES.iter().map(|def| ResourceDef::new(def.pattern)).collect())
}

/// Find the console route for a path, if any.
pub fn match_route(path: &str) -> Option<(&'static RouteDef, HashMap<String, String>)> {
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    CONSOLE_ROUTES.iter().zip(resources()).find_map(|(def, resource)| {
        let mut matched = Path::new(path.to_string());
        if !resource.capture_match_info(&mut matched) {
            return None;
        }
        let params = matched
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Some((def, params))
    })
}

/// Final answer for one navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Activated {
        route: &'static str,
        params: HashMap<String, String>,
        project: Option<ResolvedProject>,
    },
    Redirected(Redirect),
    NotFound,
    /// A newer navigation started on the same session; this result is stale
    Superseded,
}

/// Runs the guard chain of the matched route against a session.
#[derive(Debug, Clone)]
pub struct Navigator {
    auth_check: AuthCheckGuard,
    sign_in: SignInGuard,
    member: MemberGuard,
    system_admin: SystemAdminGuard,
    resolver: ProjectResolver,
}

impl Navigator {
    pub fn new(settings: GuardSettings) -> Self {
        Self {
            auth_check: AuthCheckGuard::new(settings.clone()),
            sign_in: SignInGuard::new(settings.clone()),
            member: MemberGuard::new(settings.clone()),
            system_admin: SystemAdminGuard::new(settings),
            resolver: ProjectResolver::new(),
        }
    }

    fn guard(&self, kind: GuardKind) -> &dyn Guard {
        match kind {
            GuardKind::SignIn => &self.sign_in,
            GuardKind::Member => &self.member,
            GuardKind::SystemAdmin => &self.system_admin,
        }
    }

    /// In-app navigation: a newer navigation on the same session supersedes
    /// this one.
    pub async fn navigate(
        &self,
        session: &SessionContext,
        target: &str,
        notifier: &dyn ConsoleNotifier,
    ) -> NavigationOutcome {
        let token = session.sequencer().begin();
        self.run(session, target, notifier, Some(token)).await
    }

    /// Full page load. Each document request stands alone, so loads in
    /// tabs sharing one session never supersede each other.
    pub async fn load(
        &self,
        session: &SessionContext,
        target: &str,
        notifier: &dyn ConsoleNotifier,
    ) -> NavigationOutcome {
        self.run(session, target, notifier, None).await
    }

    async fn run(
        &self,
        session: &SessionContext,
        target: &str,
        notifier: &dyn ConsoleNotifier,
        token: Option<NavigationToken>,
    ) -> NavigationOutcome {
        let navigation = match Navigation::parse(target) {
            Ok(navigation) => navigation,
            Err(e) => {
                tracing::debug!("Unparsable navigation target {}: {}", target, e);
                return NavigationOutcome::NotFound;
            }
        };

        if navigation.path == "/" {
            return NavigationOutcome::Redirected(Redirect::to(CommonRoutes::HARBOR_ROOT));
        }

        let Some((def, params)) = match_route(&navigation.path) else {
            return NavigationOutcome::NotFound;
        };
        if let Some(target) = def.redirect_to {
            return NavigationOutcome::Redirected(Redirect::to(target));
        }

        let navigation = navigation.with_params(params);
        let cx = GuardContext {
            session,
            navigation: &navigation,
            notifier,
        };

        let chain = def
            .auth_check
            .then_some(&self.auth_check as &dyn Guard)
            .into_iter()
            .chain(def.guards.iter().map(|kind| self.guard(*kind)));
        for guard in chain {
            if let Decision::DenyRedirect(redirect) = guard.can_activate(&cx).await {
                tracing::debug!("{} denied {} for session {}", guard.name(), navigation.url, session.id());
                return Self::settle(session, token, NavigationOutcome::Redirected(redirect));
            }
            if !Self::is_current(session, token) {
                return NavigationOutcome::Superseded;
            }
        }

        let project = if def.resolve_project {
            match self.resolver.resolve(session, &navigation).await {
                ResolveOutcome::Resolved(project) => Some(project),
                ResolveOutcome::Fallback(redirect) => {
                    return Self::settle(session, token, NavigationOutcome::Redirected(redirect));
                }
            }
        } else {
            None
        };

        Self::settle(
            session,
            token,
            NavigationOutcome::Activated {
                route: def.name,
                params: navigation.params,
                project,
            },
        )
    }

    fn is_current(session: &SessionContext, token: Option<NavigationToken>) -> bool {
        token.map_or(true, |token| session.sequencer().is_current(token))
    }

    // Results of superseded navigations are discarded, redirects included
    fn settle(session: &SessionContext, token: Option<NavigationToken>, outcome: NavigationOutcome) -> NavigationOutcome {
        if Self::is_current(session, token) {
            outcome
        } else {
            tracing::debug!("Discarding superseded navigation on session {}", session.id());
            NavigationOutcome::Superseded
        }
    }
}
