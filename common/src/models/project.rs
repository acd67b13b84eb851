// common/src/models/project.rs
use serde::{Deserialize, Serialize};

use super::{deserialize_flag, CurrentUser, Role, SYSTEM_ADMIN_LABEL};

/// Project metadata as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(alias = "project_id")]
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub public: bool,
    #[serde(default)]
    pub current_user_role_id: i64,
}

impl Project {
    pub fn role(&self) -> Role {
        Role::from_id(self.current_user_role_id)
    }
}

/// A project annotated with the caller's effective access.
///
/// The derived fields describe the user passed to [`ResolvedProject::resolve`]
/// and must be recomputed when that user changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedProject {
    #[serde(flatten)]
    pub project: Project,
    pub has_project_admin_role: bool,
    pub is_member: bool,
    pub role_name: Option<String>,
}

impl ResolvedProject {
    pub fn resolve(project: Project, user: Option<&CurrentUser>) -> Self {
        match user {
            Some(user) if user.admin => Self {
                project,
                has_project_admin_role: true,
                is_member: true,
                role_name: Some(SYSTEM_ADMIN_LABEL.to_string()),
            },
            Some(_) => {
                let role = project.role();
                Self {
                    has_project_admin_role: role == Role::ProjectAdmin,
                    is_member: project.current_user_role_id > 0,
                    role_name: role.label().map(str::to_string),
                    project,
                }
            }
            // Anonymous browsing of a public project
            None => Self {
                project,
                has_project_admin_role: false,
                is_member: false,
                role_name: None,
            },
        }
    }
}
