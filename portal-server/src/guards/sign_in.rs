// portal-server/src/guards/sign_in.rs
use async_trait::async_trait;
use common::{CommonRoutes, Decision, Redirect, SIGN_OUT_PARAM};

use super::{Guard, GuardContext, GuardSettings};

/// Keeps signed-in users out of the sign-in page and performs sign-out.
#[derive(Debug, Clone)]
pub struct SignInGuard {
    settings: GuardSettings,
}

impl SignInGuard {
    pub fn new(settings: GuardSettings) -> Self {
        Self { settings }
    }

    async fn sign_out(&self, cx: &GuardContext<'_>) -> Decision {
        let result = cx.session.sign_off().await;
        // Local session is dropped whatever the backend said
        cx.session.clear();

        match result {
            Ok(()) => {
                tracing::info!("Session {} signed out", cx.session.id());
                Decision::Allow
            },
            Err(e) => {
                tracing::error!("Sign-out failed for session {}: {}", cx.session.id(), e);
                Decision::redirect(Redirect::to(CommonRoutes::EMBEDDED_SIGN_IN))
            }
        }
    }
}

#[async_trait]
impl Guard for SignInGuard {
    fn name(&self) -> &'static str {
        "sign-in"
    }

    async fn can_activate(&self, cx: &GuardContext<'_>) -> Decision {
        let signing_out = cx
            .navigation
            .query_param(SIGN_OUT_PARAM)
            .is_some_and(|v| !v.is_empty());
        if signing_out {
            return self.sign_out(cx).await;
        }

        if cx.session.current_user().is_some() {
            return self.settings.landing();
        }

        match cx.session.retrieve_user().await {
            // Already signed in elsewhere; no need to sign in again
            Ok(_) => self.settings.landing(),
            Err(_) => Decision::Allow,
        }
    }
}
