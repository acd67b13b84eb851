// common/src/models/session.rs
use serde::{Deserialize, Serialize};

use super::{CurrentUser, ProjectMember};

/// Cached view of a console session, as returned by the session API.
///
/// Reading a snapshot never contacts the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub user: Option<CurrentUser>,
    pub project_members: Vec<ProjectMember>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}
