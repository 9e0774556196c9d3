//! Session state machine for the signed-in console user.
//!
//! SYSTEM CONTEXT
//! ==============
//! The route guard, the unauthorized-redirect interceptor and every CLI
//! command read the session through [`SessionStore`]. The user record is
//! mirrored to the durable store under [`USER_KEY`] so a restarted process
//! can bootstrap optimistically before the backend confirms it.
//!
//! DESIGN
//! ======
//! [`Session`] owns the state cell and its durable mirror; [`SessionStore`]
//! pairs it with the [`AuthGateway`]. The two are split so the interceptor
//! can clear the cell without holding a gateway (which holds the HTTP client
//! that holds the interceptor).
//!
//! Bootstrap is two-phase. [`Session::begin_init`] restores the snapshot
//! synchronously so a guard decision made right after it already sees the
//! optimistic user; [`SessionStore::finish_init`] then awaits the backend's
//! current-user reply.
//!
//! Every explicit transition (sign-in, clear) bumps an epoch. A verification
//! reply is applied only when the epoch it started under is still current and
//! a user is still present, so a logout issued mid-verification always wins.
//!
//! ERROR HANDLING
//! ==============
//! Durable-store failures are logged and never fail a transition. `logout`
//! finishes local cleanup before reporting a remote failure. `init_auth`
//! absorbs every verification failure except `Unauthorized`, which signs the
//! session out.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;

use parking_lot::Mutex;

use super::storage::{DurableStore, USER_KEY, load_json, remove_key, save_json};
use crate::net::api::AuthGateway;
use crate::net::http::ApiError;
use crate::net::types::{Credentials, UserRecord};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Bad credentials, or a login reply without a user.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("session is not authorized")]
    Unauthorized,

    #[error("network error: {0}")]
    Network(String),

    /// The backend answered, but not with anything usable.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<ApiError> for AuthError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Unauthorized => Self::Unauthorized,
            ApiError::Network(message) | ApiError::InvalidBaseUrl(message) | ApiError::HttpClientBuild(message) => {
                Self::Network(message)
            }
            ApiError::Decode(message) => Self::InvalidResponse(message),
            ApiError::Status { status, message } => Self::InvalidResponse(format!("status {status}: {message}")),
        }
    }
}

/// Classify a failed login call.
fn login_error(error: ApiError) -> AuthError {
    match error {
        ApiError::Unauthorized => AuthError::AuthenticationFailed("invalid credentials".to_owned()),
        ApiError::Status { status: 400 | 403, message } | ApiError::Decode(message) => {
            AuthError::AuthenticationFailed(message)
        }
        other => AuthError::from(other),
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Point-in-time copy of the session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<UserRecord>,
    /// A current-user verification is in flight.
    pub verifying: bool,
}

impl AuthState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserRecord::is_admin)
    }
}

/// How an `init_auth` pass ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitOutcome {
    /// No durable snapshot; nothing to verify.
    NoSnapshot,
    /// Another verification was already running.
    InFlight,
    /// The backend confirmed the user and the record was refreshed.
    Verified,
    /// The session changed while verifying; the reply was discarded.
    Superseded,
    /// The backend rejected the session and it was cleared.
    SignedOut,
    /// Verification failed for another reason; the restored user stays.
    Provisional,
}

/// Result of the synchronous bootstrap phase.
pub enum Bootstrap {
    Settled(InitOutcome),
    Pending(Verification),
}

#[derive(Default)]
struct Inner {
    user: Option<UserRecord>,
    epoch: u64,
    verifying: bool,
}

// =============================================================================
// SESSION
// =============================================================================

pub struct Session {
    inner: Mutex<Inner>,
    store: Arc<dyn DurableStore>,
}

impl Session {
    /// An empty session mirrored to `store`. Nothing is read until `begin_init`.
    #[must_use]
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self { inner: Mutex::new(Inner::default()), store }
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        let inner = self.inner.lock();
        AuthState { user: inner.user.clone(), verifying: inner.verifying }
    }

    #[must_use]
    pub fn user(&self) -> Option<UserRecord> {
        self.inner.lock().user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.lock().user.is_some()
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.inner.lock().epoch
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DurableStore> {
        &self.store
    }

    /// Install a freshly authenticated user.
    pub fn sign_in(&self, user: UserRecord) {
        let mut inner = self.inner.lock();
        inner.epoch += 1;
        // Durable writes stay under the lock so the mirror never lags a later transition.
        save_json(self.store.as_ref(), USER_KEY, &user);
        inner.user = Some(user);
    }

    /// Drop the user and the durable snapshot.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.epoch += 1;
        remove_key(self.store.as_ref(), USER_KEY);
        inner.user = None;
    }

    /// Restore the durable snapshot and hand out a verification ticket.
    ///
    /// Returns `InFlight` while another ticket is alive and `NoSnapshot` when
    /// there is nothing to restore; in both cases no remote call is needed.
    #[must_use]
    pub fn begin_init(self: &Arc<Self>) -> Bootstrap {
        let mut inner = self.inner.lock();
        if inner.verifying {
            return Bootstrap::Settled(InitOutcome::InFlight);
        }
        let Some(user) = load_json::<UserRecord>(self.store.as_ref(), USER_KEY) else {
            return Bootstrap::Settled(InitOutcome::NoSnapshot);
        };
        inner.user = Some(user);
        inner.verifying = true;
        Bootstrap::Pending(Verification { session: Arc::clone(self), epoch: inner.epoch })
    }

    /// Apply a confirmed user if the session has not moved on since `epoch`.
    fn apply_verified(&self, epoch: u64, user: UserRecord) -> bool {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch || inner.user.is_none() {
            return false;
        }
        save_json(self.store.as_ref(), USER_KEY, &user);
        inner.user = Some(user);
        true
    }

    /// Clear only if nothing else has transitioned the session since `epoch`.
    fn clear_if_current(&self, epoch: u64) -> bool {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            return false;
        }
        inner.epoch += 1;
        remove_key(self.store.as_ref(), USER_KEY);
        inner.user = None;
        true
    }
}

/// Proof that a verification is in flight. Dropping it releases the slot.
pub struct Verification {
    session: Arc<Session>,
    epoch: u64,
}

impl Verification {
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl Drop for Verification {
    fn drop(&mut self) {
        self.session.inner.lock().verifying = false;
    }
}

// =============================================================================
// SESSION STORE
// =============================================================================

#[derive(Clone)]
pub struct SessionStore {
    session: Arc<Session>,
    gateway: Arc<dyn AuthGateway>,
}

impl SessionStore {
    #[must_use]
    pub fn new(session: Arc<Session>, gateway: Arc<dyn AuthGateway>) -> Self {
        Self { session, gateway }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.session.snapshot()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserRecord> {
        self.session.user()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Sign in and persist the user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AuthenticationFailed`] for rejected credentials and
    /// [`AuthError::Network`] when the backend is unreachable. The session is
    /// unchanged on error.
    pub async fn login(&self, credentials: &Credentials) -> Result<UserRecord, AuthError> {
        let user = self
            .gateway
            .login(credentials)
            .await
            .map_err(login_error)?;
        tracing::info!(user_id = user.id, username = %user.username, "login succeeded");
        self.session.sign_in(user.clone());
        Ok(user)
    }

    /// Sign out remotely, then clear local state no matter what the backend said.
    ///
    /// # Errors
    ///
    /// Returns the remote failure after local cleanup has completed.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let remote = self.gateway.logout().await;
        self.session.clear();
        match remote {
            Ok(()) => {
                tracing::info!("logged out");
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, "remote logout failed; local session cleared");
                Err(error.into())
            }
        }
    }

    /// Restore and verify the session. Never fails; see [`InitOutcome`].
    pub async fn init_auth(&self) -> InitOutcome {
        match self.session.begin_init() {
            Bootstrap::Settled(outcome) => outcome,
            Bootstrap::Pending(ticket) => self.finish_init(ticket).await,
        }
    }

    /// Await the backend's verdict on a restored session.
    pub async fn finish_init(&self, ticket: Verification) -> InitOutcome {
        let epoch = ticket.epoch();
        let outcome = match self.gateway.current_user().await {
            Ok(user) => {
                if self.session.apply_verified(epoch, user) {
                    InitOutcome::Verified
                } else {
                    InitOutcome::Superseded
                }
            }
            Err(ApiError::Unauthorized) => {
                if self.session.clear_if_current(epoch) {
                    self.revoke_remote().await;
                }
                // The unauthorized interceptor may already have cleared it.
                if self.session.is_authenticated() { InitOutcome::Superseded } else { InitOutcome::SignedOut }
            }
            Err(error) => {
                if self.session.epoch() == epoch {
                    tracing::warn!(%error, "session verification failed; keeping restored user");
                    InitOutcome::Provisional
                } else {
                    InitOutcome::Superseded
                }
            }
        };
        drop(ticket);
        tracing::debug!(?outcome, "init_auth finished");
        outcome
    }

    async fn revoke_remote(&self) {
        if let Err(error) = self.gateway.logout().await {
            tracing::debug!(%error, "remote logout after rejected session failed");
        }
    }
}
