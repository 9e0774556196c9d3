//! Model-config, service-control, and dashboard calls.

#[cfg(test)]
#[path = "api_ops_test.rs"]
mod api_ops_test;

use std::sync::Arc;

use super::http::{ApiError, HttpClient};
use super::types::{ActionReply, DashboardStatistics, ModelConfig, RecordId, ServiceActionReply, ServiceControl};
use super::{detail_action_path, detail_path, list_action_path};

const MODELS_PATH: &str = "/v1/models/";
const SERVICES_PATH: &str = "/v1/services/";
const DASHBOARD_STATISTICS_PATH: &str = "/v1/dashboard/statistics/";

// =============================================================================
// MODEL CONFIGS
// =============================================================================

#[derive(Clone)]
pub struct ModelsApi {
    http: Arc<HttpClient>,
}

impl ModelsApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Active config first, then by name.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn list(&self) -> Result<Vec<ModelConfig>, ApiError> {
        self.http.get(MODELS_PATH).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn get(&self, id: RecordId) -> Result<ModelConfig, ApiError> {
        self.http.get(&detail_path(MODELS_PATH, id)).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn create(&self, model: &serde_json::Value) -> Result<ModelConfig, ApiError> {
        self.http.post(MODELS_PATH, model).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn update(&self, id: RecordId, model: &serde_json::Value) -> Result<ModelConfig, ApiError> {
        self.http.put(&detail_path(MODELS_PATH, id), model).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn delete(&self, id: RecordId) -> Result<ActionReply, ApiError> {
        self.http.delete(&detail_path(MODELS_PATH, id)).await
    }

    /// Make this config the active one; the backend deactivates the rest.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn activate(&self, id: RecordId) -> Result<ActionReply, ApiError> {
        self.http
            .post_empty(&detail_action_path(MODELS_PATH, id, "activate"))
            .await
    }

    /// Reload the model weights. Only valid for the active config (400 otherwise).
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn reload(&self, id: RecordId) -> Result<ActionReply, ApiError> {
        self.http
            .post_empty(&detail_action_path(MODELS_PATH, id, "reload_model"))
            .await
    }
}

// =============================================================================
// SERVICES
// =============================================================================

#[derive(Clone)]
pub struct ServicesApi {
    http: Arc<HttpClient>,
}

impl ServicesApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn list(&self) -> Result<Vec<ServiceControl>, ApiError> {
        self.http.get(SERVICES_PATH).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn get(&self, id: RecordId) -> Result<ServiceControl, ApiError> {
        self.http.get(&detail_path(SERVICES_PATH, id)).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn create(&self, service: &serde_json::Value) -> Result<ServiceControl, ApiError> {
        self.http.post(SERVICES_PATH, service).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn update(&self, id: RecordId, service: &serde_json::Value) -> Result<ServiceControl, ApiError> {
        self.http.put(&detail_path(SERVICES_PATH, id), service).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn delete(&self, id: RecordId) -> Result<ActionReply, ApiError> {
        self.http.delete(&detail_path(SERVICES_PATH, id)).await
    }

    /// Start the service's command; a running service replies with `status: "warning"`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn start(&self, id: RecordId) -> Result<ServiceActionReply, ApiError> {
        self.http
            .post_empty(&detail_action_path(SERVICES_PATH, id, "start"))
            .await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn stop(&self, id: RecordId) -> Result<ServiceActionReply, ApiError> {
        self.http
            .post_empty(&detail_action_path(SERVICES_PATH, id, "stop"))
            .await
    }

    /// Re-probe every service's process and return the refreshed list.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn refresh_status(&self) -> Result<Vec<ServiceControl>, ApiError> {
        self.http
            .get(&list_action_path(SERVICES_PATH, "refresh_status"))
            .await
    }
}

// =============================================================================
// DASHBOARD
// =============================================================================

#[derive(Clone)]
pub struct DashboardApi {
    http: Arc<HttpClient>,
}

impl DashboardApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn statistics(&self) -> Result<DashboardStatistics, ApiError> {
        self.http.get(DASHBOARD_STATISTICS_PATH).await
    }
}
