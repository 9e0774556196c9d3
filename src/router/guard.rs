//! Navigation guard: session bootstrap plus role gating.
//!
//! DESIGN
//! ======
//! [`decide`] is a pure function of the target route and a session snapshot.
//! [`RouteGuard::before_each`] kicks off session bootstrap first: the durable
//! snapshot is restored synchronously, so the decision already sees the
//! optimistic user, and the backend verification runs as a background task.
//! Callers that must observe the verified state await [`RouteGuard::settle`].

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::ResolvedRoute;
use crate::state::auth::{AuthState, Bootstrap, InitOutcome, SessionStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    RedirectHome,
    RedirectLogin,
}

/// First match wins: admin gate, auth gate, login-while-signed-in, proceed.
#[must_use]
pub fn decide(target: &ResolvedRoute, state: &AuthState) -> GuardDecision {
    if target.requires_admin() && !state.is_admin() {
        GuardDecision::RedirectHome
    } else if target.requires_auth() && !state.is_authenticated() {
        GuardDecision::RedirectLogin
    } else if target.is_login() && state.is_authenticated() {
        GuardDecision::RedirectHome
    } else {
        GuardDecision::Proceed
    }
}

pub struct RouteGuard {
    sessions: SessionStore,
    pending: Mutex<Option<JoinHandle<InitOutcome>>>,
}

impl RouteGuard {
    #[must_use]
    pub fn new(sessions: SessionStore) -> Self {
        Self { sessions, pending: Mutex::new(None) }
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Bootstrap the session, then decide on `target`.
    ///
    /// Every navigation re-reads the snapshot and re-verifies it with the
    /// backend, so a session revoked elsewhere is noticed on the next route.
    ///
    /// Outside a Tokio runtime the verification is skipped and the decision
    /// rests on the restored snapshot alone.
    pub fn before_each(&self, target: &ResolvedRoute) -> GuardDecision {
        match self.sessions.session().begin_init() {
            Bootstrap::Settled(outcome) => tracing::trace!(?outcome, "session bootstrap settled"),
            Bootstrap::Pending(ticket) => match Handle::try_current() {
                Ok(handle) => {
                    let sessions = self.sessions.clone();
                    let task = handle.spawn(async move { sessions.finish_init(ticket).await });
                    *self.pending.lock() = Some(task);
                }
                Err(_) => {
                    tracing::debug!("no async runtime; skipping session verification");
                    drop(ticket);
                }
            },
        }

        let decision = decide(target, &self.sessions.state());
        tracing::debug!(path = %target.path, ?decision, "route guard");
        decision
    }

    /// Wait for the most recently spawned verification, if any.
    pub async fn settle(&self) -> Option<InitOutcome> {
        let task = self.pending.lock().take()?;
        match task.await {
            Ok(outcome) => Some(outcome),
            Err(error) => {
                tracing::warn!(%error, "session verification task failed");
                None
            }
        }
    }
}
