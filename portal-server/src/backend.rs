// portal-server/src/backend.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::models::{CurrentUser, Project, ProjectMember};
use common::{BackendConfig, GuardError};
use reqwest::header;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

const CURRENT_USER_PATH: &str = "api/users/current";
const SIGN_OUT_PATH: &str = "c/log_out";

/// Errors raised while talking to the registry backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ApiError> for GuardError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Status { status, url } => GuardError::Backend {
                status,
                message: format!("{} answered with status {}", url, status),
            },
            other => GuardError::Transport(other.to_string()),
        }
    }
}

/// The backend endpoints the guard layer consults.
///
/// Implementations translate failures into the guard taxonomy: an
/// unauthenticated identity call is `Unauthenticated`, a refused membership
/// listing is `NotAMember`, a missing project is `ProjectNotFound`.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    async fn current_user(&self) -> Result<CurrentUser, GuardError>;

    async fn sign_out(&self) -> Result<(), GuardError>;

    async fn project(&self, project_id: i64) -> Result<Project, GuardError>;

    async fn project_members(&self, project_id: i64) -> Result<Vec<ProjectMember>, GuardError>;
}

/// Builds a backend handle bound to one browser's session cookie.
pub trait ApiFactory: Send + Sync {
    fn for_session(&self, session_cookie: Option<&str>) -> Arc<dyn RegistryApi>;
}

/// `reqwest` client for the registry backend's JSON API
#[derive(Clone, Debug)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    cookie_name: String,
    session_cookie: Option<String>,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        // Relative joins keep any path prefix of the base url
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            http,
            base_url: Url::parse(&base)?,
            cookie_name: config.session_cookie.clone(),
            session_cookie: None,
        })
    }

    /// Clone of this client that forwards the given session cookie value.
    pub fn with_session(&self, session_cookie: Option<&str>) -> Self {
        Self {
            session_cookie: session_cookie.map(str::to_string),
            ..self.clone()
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        let url = self.endpoint(path)?;
        let mut request = self.http.get(url.clone()).header(header::ACCEPT, "application/json");
        if let Some(value) = &self.session_cookie {
            request = request.header(header::COOKIE, format!("{}={}", self.cookie_name, value));
        }

        tracing::debug!("GET {}", url);
        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.get(path).await?;
        let url = response.url().to_string();
        response
            .json::<T>()
            .await
            .map_err(|source| ApiError::Transport { url, source })
    }
}

#[async_trait]
impl RegistryApi for BackendClient {
    async fn current_user(&self) -> Result<CurrentUser, GuardError> {
        self.get_json(CURRENT_USER_PATH).await.map_err(|e| match e.status() {
            Some(401) | Some(403) => GuardError::Unauthenticated,
            _ => e.into(),
        })
    }

    async fn sign_out(&self) -> Result<(), GuardError> {
        self.get(SIGN_OUT_PATH).await?;
        Ok(())
    }

    async fn project(&self, project_id: i64) -> Result<Project, GuardError> {
        let path = format!("api/projects/{}", project_id);
        self.get_json(&path).await.map_err(|e| match e.status() {
            Some(404) => GuardError::ProjectNotFound { project_id },
            _ => e.into(),
        })
    }

    async fn project_members(&self, project_id: i64) -> Result<Vec<ProjectMember>, GuardError> {
        let path = format!("api/projects/{}/members", project_id);
        self.get_json(&path).await.map_err(|e| match e.status() {
            Some(401) | Some(403) | Some(404) => GuardError::NotAMember { project_id },
            _ => e.into(),
        })
    }
}

impl ApiFactory for BackendClient {
    fn for_session(&self, session_cookie: Option<&str>) -> Arc<dyn RegistryApi> {
        Arc::new(self.with_session(session_cookie))
    }
}
