//! Authentication and user-management REST calls.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store talks to the backend only through [`AuthGateway`], so
//! its state machine can be exercised against mocks; [`AuthApi`] is the
//! production implementation over [`HttpClient`].
//!
//! ERROR HANDLING
//! ==============
//! A success reply without a `user` object is reported as
//! [`ApiError::Decode`]; the session never receives an unvalidated record.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;

use super::http::{ApiError, HttpClient};
use super::types::{ActionReply, Credentials, RecordId, UserEnvelope, UserList, UserRecord};

/// Credential submission; a 401 here means bad credentials, not an expired session.
pub const LOGIN_PATH: &str = "/auth/login/";
const LOGOUT_PATH: &str = "/auth/logout/";
const CURRENT_USER_PATH: &str = "/auth/user/";
const USERS_PATH: &str = "/auth/users/";
const USER_CREATE_PATH: &str = "/auth/users/create/";

fn user_update_path(user_id: RecordId) -> String {
    format!("/auth/users/{user_id}/update/")
}

fn user_delete_path(user_id: RecordId) -> String {
    format!("/auth/users/{user_id}/delete/")
}

fn require_user(envelope: UserEnvelope) -> Result<UserRecord, ApiError> {
    envelope
        .user
        .ok_or_else(|| ApiError::Decode("response has no user".to_owned()))
}

// =============================================================================
// GATEWAY TRAIT
// =============================================================================

/// The three backend calls the session store depends on.
#[async_trait::async_trait]
pub trait AuthGateway: Send + Sync {
    /// `POST /auth/login/`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the reply carries no user.
    async fn login(&self, credentials: &Credentials) -> Result<UserRecord, ApiError>;

    /// `POST /auth/logout/`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    async fn logout(&self) -> Result<(), ApiError>;

    /// `GET /auth/user/`, the authoritative "who am I".
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the session cookie is no longer valid.
    async fn current_user(&self) -> Result<UserRecord, ApiError>;
}

// =============================================================================
// AUTH API
// =============================================================================

#[derive(Clone)]
pub struct AuthApi {
    http: Arc<HttpClient>,
}

impl AuthApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl AuthGateway for AuthApi {
    async fn login(&self, credentials: &Credentials) -> Result<UserRecord, ApiError> {
        tracing::debug!(username = %credentials.username, "login request");
        let envelope: UserEnvelope = self.http.post(LOGIN_PATH, credentials).await?;
        require_user(envelope)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let _reply: ActionReply = self.http.post_empty(LOGOUT_PATH).await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<UserRecord, ApiError> {
        let envelope: UserEnvelope = self.http.get(CURRENT_USER_PATH).await?;
        require_user(envelope)
    }
}

// =============================================================================
// USERS (admin only)
// =============================================================================

#[derive(Clone)]
pub struct UsersApi {
    http: Arc<HttpClient>,
}

impl UsersApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// List all users.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn list(&self) -> Result<Vec<UserRecord>, ApiError> {
        let list: UserList = self.http.get(USERS_PATH).await?;
        Ok(list.users)
    }

    /// Create a user from a `{username, email, password, is_staff}` body.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the reply carries no user.
    pub async fn create(&self, user: &serde_json::Value) -> Result<UserRecord, ApiError> {
        let envelope: UserEnvelope = self.http.post(USER_CREATE_PATH, user).await?;
        require_user(envelope)
    }

    /// Update a user.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the reply carries no user.
    pub async fn update(&self, user_id: RecordId, user: &serde_json::Value) -> Result<UserRecord, ApiError> {
        let envelope: UserEnvelope = self.http.put(&user_update_path(user_id), user).await?;
        require_user(envelope)
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn delete(&self, user_id: RecordId) -> Result<ActionReply, ApiError> {
        self.http.delete(&user_delete_path(user_id)).await
    }
}
