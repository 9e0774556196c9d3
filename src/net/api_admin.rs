//! API-key and API-endpoint management calls.
//!
//! The backend wraps both lists in an envelope (`{api_keys}`, `{endpoints}`);
//! a reply missing the list decodes as empty rather than failing.

#[cfg(test)]
#[path = "api_admin_test.rs"]
mod api_admin_test;

use std::sync::Arc;

use super::http::{ApiError, HttpClient};
use super::types::{
    ActionReply, ApiEndpoint, ApiEndpointList, ApiKey, ApiKeyList, CreatedApiKey, EndpointTest, RecordId,
    UpdatedApiKey,
};

const API_KEYS_PATH: &str = "/v1/api-keys";
const API_KEY_CREATE_PATH: &str = "/v1/api-keys/create";
const ENDPOINTS_PATH: &str = "/v1/endpoints";
const ENDPOINT_CREATE_PATH: &str = "/v1/endpoints/create";
const ENDPOINT_TEST_PATH: &str = "/test/execute/";

fn api_key_action_path(key_id: RecordId, action: &str) -> String {
    format!("{API_KEYS_PATH}/{key_id}/{action}")
}

fn endpoint_action_path(endpoint_id: RecordId, action: &str) -> String {
    format!("{ENDPOINTS_PATH}/{endpoint_id}/{action}")
}

fn endpoint_detail_path(endpoint_id: RecordId) -> String {
    format!("/endpoint/{endpoint_id}/")
}

// =============================================================================
// API KEYS
// =============================================================================

#[derive(Clone)]
pub struct ApiKeysApi {
    http: Arc<HttpClient>,
}

impl ApiKeysApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// List API keys (secrets masked).
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn list(&self) -> Result<Vec<ApiKey>, ApiError> {
        let list: ApiKeyList = self.http.get(API_KEYS_PATH).await?;
        Ok(list.api_keys)
    }

    /// Create a key; the reply is the only place the full secret appears.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn create(&self, key: &serde_json::Value) -> Result<CreatedApiKey, ApiError> {
        self.http.post(API_KEY_CREATE_PATH, key).await
    }

    /// Update a key's name, limits, or activation.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn update(&self, key_id: RecordId, key: &serde_json::Value) -> Result<UpdatedApiKey, ApiError> {
        self.http
            .put(&api_key_action_path(key_id, "update"), key)
            .await
    }

    /// Delete a key.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn delete(&self, key_id: RecordId) -> Result<ActionReply, ApiError> {
        self.http
            .delete(&api_key_action_path(key_id, "delete"))
            .await
    }
}

// =============================================================================
// API ENDPOINTS
// =============================================================================

#[derive(Clone)]
pub struct EndpointsApi {
    http: Arc<HttpClient>,
}

impl EndpointsApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// List registered endpoints.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn list(&self) -> Result<Vec<ApiEndpoint>, ApiError> {
        let list: ApiEndpointList = self.http.get(ENDPOINTS_PATH).await?;
        Ok(list.endpoints)
    }

    /// Fetch one endpoint.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn get(&self, endpoint_id: RecordId) -> Result<ApiEndpoint, ApiError> {
        self.http.get(&endpoint_detail_path(endpoint_id)).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn create(&self, endpoint: &serde_json::Value) -> Result<ApiEndpoint, ApiError> {
        self.http.post(ENDPOINT_CREATE_PATH, endpoint).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn update(&self, endpoint_id: RecordId, endpoint: &serde_json::Value) -> Result<ApiEndpoint, ApiError> {
        self.http
            .put(&endpoint_action_path(endpoint_id, "update"), endpoint)
            .await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn delete(&self, endpoint_id: RecordId) -> Result<ActionReply, ApiError> {
        self.http
            .delete(&endpoint_action_path(endpoint_id, "delete"))
            .await
    }

    /// Execute a test call against an endpoint and return the raw result.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn test(&self, test: EndpointTest) -> Result<serde_json::Value, ApiError> {
        self.http
            .post(ENDPOINT_TEST_PATH, &test.into_wire())
            .await
    }
}
