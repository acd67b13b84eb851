// portal-server/src/api/navigation.rs
use std::collections::HashMap;

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use common::models::ResolvedProject;
use common::{post_sign_in_target, Notice, REDIRECT_URL_PARAM};
use serde::{Deserialize, Serialize};

use crate::guards::Navigation;
use crate::router::NavigationOutcome;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NavigationQuery {
    pub url: String,
}

/// JSON form of a navigation outcome for client-side routers
#[derive(Debug, Serialize)]
pub struct NavigationReport {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<&'static str>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub params: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ResolvedProject>,
    /// Where the sign-in page sends the user once credentials are accepted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_sign_in: Option<String>,
    pub notices: Vec<Notice>,
}

impl NavigationReport {
    pub fn new(outcome: NavigationOutcome, notices: Vec<Notice>) -> Self {
        let mut report = Self {
            outcome: "",
            redirect: None,
            route: None,
            params: HashMap::new(),
            project: None,
            after_sign_in: None,
            notices,
        };

        match outcome {
            NavigationOutcome::Activated { route, params, project } => {
                report.outcome = "activated";
                report.route = Some(route);
                report.params = params;
                report.project = project;
            },
            NavigationOutcome::Redirected(redirect) => {
                report.outcome = "redirected";
                report.redirect = Some(redirect.location());
            },
            NavigationOutcome::NotFound => report.outcome = "not_found",
            NavigationOutcome::Superseded => report.outcome = "superseded",
        }
        report
    }
}

// Evaluate the guard chain for a console url
#[get("/navigation")]
pub async fn evaluate_navigation(
    req: HttpRequest,
    query: web::Query<NavigationQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    let (outcome, notices) = state.evaluate(&req, &query.url).await;
    tracing::debug!("Navigation to {} resolved as {:?}", query.url, outcome);

    let mut report = NavigationReport::new(outcome, notices);
    if report.route == Some("sign-in") {
        let redirect_url = Navigation::parse(&query.url)
            .ok()
            .and_then(|nav| nav.query_param(REDIRECT_URL_PARAM).map(str::to_string));
        report.after_sign_in =
            Some(post_sign_in_target(redirect_url.as_deref(), &state.default_landing).to_string());
    }
    HttpResponse::Ok().json(report)
}
