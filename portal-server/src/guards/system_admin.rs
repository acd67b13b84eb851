// portal-server/src/guards/system_admin.rs
use async_trait::async_trait;
use common::Decision;

use super::{sign_in_redirect, Guard, GuardContext, GuardSettings};

/// Restricts user, group, registry, replication and configuration screens
/// to system administrators.
#[derive(Debug, Clone)]
pub struct SystemAdminGuard {
    settings: GuardSettings,
}

impl SystemAdminGuard {
    pub fn new(settings: GuardSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Guard for SystemAdminGuard {
    fn name(&self) -> &'static str {
        "system-admin"
    }

    async fn can_activate(&self, cx: &GuardContext<'_>) -> Decision {
        let user = match cx.session.current_user() {
            Some(user) => user,
            None => match cx.session.retrieve_user().await {
                Ok(user) => user,
                Err(_) => return sign_in_redirect(&cx.navigation.url),
            },
        };

        if user.admin {
            Decision::Allow
        } else {
            tracing::info!("User {} is not an administrator, denying {}", user.username, cx.navigation.url);
            self.settings.landing()
        }
    }
}
