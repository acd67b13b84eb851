// common/src/models/user.rs
use serde::{Deserialize, Serialize};

use super::{deserialize_flag, Role};

/// Identity returned by the backend's "who am I" endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(alias = "user_id")]
    pub id: i64,
    pub username: String,
    #[serde(alias = "has_admin_role", default, deserialize_with = "deserialize_flag")]
    pub admin: bool,
}

/// One entry of a project's member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub id: i64,
    #[serde(default)]
    pub project_id: i64,
    #[serde(default)]
    pub entity_name: String,
    #[serde(default)]
    pub entity_type: String,
    #[serde(default)]
    pub role_id: i64,
}

impl ProjectMember {
    pub fn role(&self) -> Role {
        Role::from_id(self.role_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_backend_spellings() {
        let user: CurrentUser = serde_json::from_str(r#"{"user_id": 3, "username": "alice", "has_admin_role": 1}"#)
            .expect("backend user");
        assert_eq!(user.id, 3);
        assert!(user.admin);

        let user: CurrentUser = serde_json::from_str(r#"{"id": 4, "username": "bob", "admin": false}"#)
            .expect("plain user");
        assert!(!user.admin);
    }

    #[test]
    fn missing_admin_flag_means_regular_user() {
        let user: CurrentUser = serde_json::from_str(r#"{"id": 5, "username": "carol"}"#).expect("user");
        assert!(!user.admin);
    }

    #[test]
    fn member_role_follows_role_id() {
        let member: ProjectMember = serde_json::from_str(
            r#"{"id": 8, "project_id": 2, "entity_name": "dave", "entity_type": "u", "role_id": 3}"#,
        )
        .expect("member");
        assert_eq!(member.role(), Role::Guest);
    }
}
