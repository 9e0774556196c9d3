//! Global unauthorized-response handling.
//!
//! SYSTEM CONTEXT
//! ==============
//! Any gateway call answered with 401 means the backend no longer honors the
//! session. The interceptor installed here clears the session locally and
//! sends the navigator to the login route before the error reaches the
//! caller, so every view applies identical redirect behavior.
//!
//! The login call is exempt: a 401 there rejects the submitted credentials
//! and must leave the current session untouched.
//!
//! TRADE-OFFS
//! ==========
//! Cleanup is local only. Issuing a remote logout from inside the interceptor
//! would itself be answered with 401 and re-enter it.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::{Arc, Weak};

use crate::net::api::LOGIN_PATH as LOGIN_ENDPOINT;
use crate::net::http::{ApiError, HttpClient, ResponseInterceptor};
use crate::router::LOGIN_PATH;
use crate::router::navigator::Navigator;
use crate::state::auth::Session;

/// True for errors on `path` that must end the session.
#[must_use]
pub fn should_redirect_unauth(path: &str, error: &ApiError) -> bool {
    error.is_unauthorized() && path != LOGIN_ENDPOINT
}

pub struct UnauthRedirect {
    session: Arc<Session>,
    navigator: Weak<Navigator>,
}

impl UnauthRedirect {
    #[must_use]
    pub fn new(session: Arc<Session>, navigator: Weak<Navigator>) -> Self {
        Self { session, navigator }
    }
}

impl ResponseInterceptor for UnauthRedirect {
    fn on_error(&self, path: &str, error: &ApiError) {
        if !should_redirect_unauth(path, error) {
            return;
        }
        tracing::info!(%path, "session rejected by backend; signing out");
        self.session.clear();

        let Some(navigator) = self.navigator.upgrade() else {
            return;
        };
        if navigator.current().is_some_and(|location| location.is_login()) {
            return;
        }
        if let Err(error) = navigator.push(LOGIN_PATH) {
            tracing::warn!(%error, "redirect to login failed");
        }
    }
}

/// Register the 401 redirect on `http`.
pub fn install_unauth_redirect(http: &HttpClient, session: Arc<Session>, navigator: &Arc<Navigator>) {
    http.add_interceptor(Arc::new(UnauthRedirect::new(session, Arc::downgrade(navigator))));
}
