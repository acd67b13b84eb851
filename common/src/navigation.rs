// common/src/navigation.rs
use serde::{Deserialize, Serialize};
use url::{form_urlencoded, Url};

/// Fixed console routes shared by every guard.
pub struct CommonRoutes;

impl CommonRoutes {
    pub const HARBOR_ROOT: &'static str = "/harbor";
    pub const EMBEDDED_SIGN_IN: &'static str = "/harbor/sign-in";
    pub const HARBOR_DEFAULT: &'static str = "/harbor/projects";
    pub const PROJECT_LIST: &'static str = "/harbor/projects";
}

// Stand-in origin for resolving console-relative targets
const LOCAL_ORIGIN: &str = "http://console.invalid";

/// Query parameter carrying the original target through sign-in
pub const REDIRECT_URL_PARAM: &str = "redirect_url";
/// Query parameter asking the sign-in route to end the session
pub const SIGN_OUT_PARAM: &str = "signout";
/// Query parameter fallback for the project id
pub const PROJECT_ID_PARAM: &str = "project_id";

/// Where a denied navigation is sent instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Redirect {
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Path plus url-encoded query, suitable for a `Location` header.
    pub fn location(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{}", self.path, query)
    }
}

/// Outcome of a single guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "redirect", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    DenyRedirect(Redirect),
}

impl Decision {
    pub fn redirect(redirect: Redirect) -> Self {
        Decision::DenyRedirect(redirect)
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Side effects the auth check asks the UI to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    ClearMessages,
    CloseSearch,
    ReadOnly,
}

/// Where to go once the sign-in form succeeds.
///
/// Only same-origin paths are honoured; anything else lands on `default_landing`.
pub fn post_sign_in_target<'a>(redirect_url: Option<&'a str>, default_landing: &'a str) -> &'a str {
    match redirect_url.map(str::trim) {
        Some(url) if is_same_origin_path(url) => url,
        _ => default_landing,
    }
}

// Browsers read `\` as `/` and drop tabs and newlines, so the target must
// still resolve against the console's own origin after url parsing
fn is_same_origin_path(url: &str) -> bool {
    if !url.starts_with('/') || url.starts_with("//") || url.contains('\\') {
        return false;
    }
    let Ok(base) = Url::parse(LOCAL_ORIGIN) else {
        return false;
    };
    base.join(url)
        .map(|joined| joined.origin() == base.origin())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn location_encodes_redirect_target() {
        let redirect = Redirect::to(CommonRoutes::EMBEDDED_SIGN_IN)
            .with_query(REDIRECT_URL_PARAM, "/harbor/users?page=2");
        assert_eq!(
            redirect.location(),
            "/harbor/sign-in?redirect_url=%2Fharbor%2Fusers%3Fpage%3D2"
        );
        assert_eq!(redirect.query_value(REDIRECT_URL_PARAM), Some("/harbor/users?page=2"));
    }

    #[test]
    fn bare_location_has_no_query() {
        assert_eq!(Redirect::to("/harbor/projects").location(), "/harbor/projects");
    }

    #[test]
    fn decision_serializes_with_tag() {
        let json = serde_json::to_value(Decision::redirect(Redirect::to("/harbor/projects")))
            .expect("serialize");
        assert_eq!(json["decision"], "deny_redirect");
        assert_eq!(json["redirect"]["path"], "/harbor/projects");
    }

    #[rstest]
    #[case(None, "/harbor/projects")]
    #[case(Some(""), "/harbor/projects")]
    #[case(Some("/harbor/projects/3/members"), "/harbor/projects/3/members")]
    #[case(Some("//evil.example/x"), "/harbor/projects")]
    #[case(Some("https://evil.example/"), "/harbor/projects")]
    #[case(Some("/\\evil.example/x"), "/harbor/projects")]
    #[case(Some("/\\/evil.example"), "/harbor/projects")]
    #[case(Some("/\t/evil.example"), "/harbor/projects")]
    #[case(Some("/harbor/logs?page=2"), "/harbor/logs?page=2")]
    fn sign_in_target(#[case] redirect_url: Option<&str>, #[case] expected: &str) {
        assert_eq!(post_sign_in_target(redirect_url, CommonRoutes::HARBOR_DEFAULT), expected);
    }
}
