// common/src/error.rs
use thiserror::Error;

/// Failures a guard can observe while consulting the backend.
///
/// Guards never hand these to the router; every variant is folded into an
/// allow or deny-and-redirect decision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("no authenticated session")]
    Unauthenticated,

    #[error("caller is not a member of project {project_id}")]
    NotAMember { project_id: i64 },

    #[error("project {project_id} not found")]
    ProjectNotFound { project_id: i64 },

    #[error("backend answered {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("backend unreachable: {0}")]
    Transport(String),
}

impl GuardError {
    /// True for failures caused by the network rather than by the backend's answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, GuardError::Transport(_))
    }
}
