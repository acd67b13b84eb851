// common/src/models/role.rs
use serde::{Deserialize, Serialize};

/// Label reported for system administrators regardless of project role.
pub const SYSTEM_ADMIN_LABEL: &str = "system-admin";

/// A caller's role within a project, as encoded by the backend's role id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    ProjectAdmin,
    Developer,
    Guest,
    /// Role id zero or negative: the caller holds no role
    NoRole,
    Unrecognized(i64),
}

impl Role {
    pub const PROJECT_ADMIN_ID: i64 = 1;
    pub const DEVELOPER_ID: i64 = 2;
    pub const GUEST_ID: i64 = 3;

    pub fn from_id(id: i64) -> Self {
        match id {
            Self::PROJECT_ADMIN_ID => Role::ProjectAdmin,
            Self::DEVELOPER_ID => Role::Developer,
            Self::GUEST_ID => Role::Guest,
            id if id <= 0 => Role::NoRole,
            id => Role::Unrecognized(id),
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Role::ProjectAdmin => Self::PROJECT_ADMIN_ID,
            Role::Developer => Self::DEVELOPER_ID,
            Role::Guest => Self::GUEST_ID,
            Role::NoRole => 0,
            Role::Unrecognized(id) => *id,
        }
    }

    pub fn label(&self) -> Option<&'static str> {
        match self {
            Role::ProjectAdmin => Some("project-admin"),
            Role::Developer => Some("developer"),
            Role::Guest => Some("guest"),
            Role::NoRole | Role::Unrecognized(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, Role::ProjectAdmin, Some("project-admin"))]
    #[case(2, Role::Developer, Some("developer"))]
    #[case(3, Role::Guest, Some("guest"))]
    #[case(0, Role::NoRole, None)]
    #[case(-4, Role::NoRole, None)]
    #[case(9, Role::Unrecognized(9), None)]
    fn every_id_maps_to_a_role(#[case] id: i64, #[case] role: Role, #[case] label: Option<&str>) {
        assert_eq!(Role::from_id(id), role);
        assert_eq!(role.label(), label);
    }

    #[test]
    fn known_roles_keep_their_id() {
        for role in [Role::ProjectAdmin, Role::Developer, Role::Guest, Role::Unrecognized(7)] {
            assert_eq!(Role::from_id(role.id()), role);
        }
    }
}
