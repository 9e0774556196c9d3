//! Wire DTOs for the admin backend REST API.
//!
//! DESIGN
//! ======
//! Backend responses are decoded into these explicit types at the gateway
//! boundary, so callers (and the session store in particular) never handle
//! untyped JSON. Fields the backend marks read-only or sometimes omits are
//! `#[serde(default)]` so older deployments still decode.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Backend primary keys are integers.
pub type RecordId = i64;

// =============================================================================
// AUTH
// =============================================================================

/// An authenticated user as returned by `/auth/login/` and `/auth/user/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: RecordId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Staff users may open admin-only views.
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UserRecord {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_staff
    }
}

/// Username/password pair posted to `/auth/login/`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `{status, user}` envelope around auth and user-management replies.
///
/// `user` is optional on the wire so a reply without it surfaces as a
/// validation error instead of a decode error.
#[derive(Clone, Debug, Deserialize)]
pub struct UserEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub user: Option<UserRecord>,
}

/// `{users}` reply of `/auth/users/`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserList {
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

/// Generic `{status, message}` acknowledgement returned by action endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// API KEYS
// =============================================================================

/// An API key with the secret masked (`abcd1234...wxyz`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, deserialize_with = "deserialize_i64_from_number_or_default")]
    pub call_count: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub allowed_ips: Option<String>,
    #[serde(default)]
    pub rate_limit_override: Option<i64>,
}

/// `{api_keys}` reply of `/v1/api-keys`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ApiKeyList {
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
}

/// Reply of `/v1/api-keys/create`; the full secret is only ever shown here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedApiKey {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub api_key: String,
    pub key_info: ApiKeyInfo,
}

/// Reply of `/v1/api-keys/{id}/update`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedApiKey {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub key_info: ApiKeyInfo,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyInfo {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

// =============================================================================
// API ENDPOINTS
// =============================================================================

/// A registered backend API endpoint and its call statistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: RecordId,
    pub name: String,
    pub path: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    pub request_schema: Option<serde_json::Value>,
    #[serde(default)]
    pub response_schema: Option<serde_json::Value>,
    #[serde(default)]
    pub rate_limit: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_i64_from_number_or_default")]
    pub call_count: i64,
    #[serde(default, deserialize_with = "deserialize_i64_from_number_or_default")]
    pub error_count: i64,
    #[serde(default)]
    pub average_response_time: f64,
    #[serde(default)]
    pub version: Option<String>,
}

fn default_method() -> String {
    "GET".to_owned()
}

/// `{endpoints}` reply of `/v1/endpoints`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ApiEndpointList {
    #[serde(default)]
    pub endpoints: Vec<ApiEndpoint>,
}

/// Request for `/test/execute/`.
///
/// `body` is structured for callers; the backend expects it as a JSON string
/// in `request_body`, see [`EndpointTest::into_wire`].
#[derive(Clone, Debug, PartialEq)]
pub struct EndpointTest {
    pub endpoint_id: RecordId,
    pub api_key: Option<String>,
    pub body: Option<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EndpointTestWire {
    pub endpoint_id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
}

impl EndpointTest {
    #[must_use]
    pub fn into_wire(self) -> EndpointTestWire {
        EndpointTestWire {
            endpoint_id: self.endpoint_id,
            api_key: self.api_key,
            request_body: self.body.map(|body| body.to_string()),
        }
    }
}

// =============================================================================
// KNOWLEDGE
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_i64_from_number_or_default")]
    pub document_count: i64,
    #[serde(default)]
    pub is_indexed: bool,
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: RecordId,
    pub knowledge_base: RecordId,
    pub content: String,
    #[serde(default)]
    pub is_indexed: bool,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

// =============================================================================
// MODELS / TEMPLATES / SERVICES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: RecordId,
    pub name: String,
    pub model_path: String,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub device_display: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub batch_size: Option<i64>,
    #[serde(default)]
    pub precision: Option<String>,
    #[serde(default)]
    pub precision_display: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: RecordId,
    /// Dotted `category.type` name.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A template category with its `type -> content` map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptCategory {
    pub category: String,
    #[serde(default)]
    pub types: BTreeMap<String, String>,
}

/// Body of `/v1/templates/batch_update/`: `{category: {type: content}}`.
pub type TemplateBatch = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceControl {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_display: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub pid: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Reply of service `start`/`stop`; `pid` is set only after a start.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceActionReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<i64>,
}

// =============================================================================
// DASHBOARD
// =============================================================================

/// Reply of `/v1/dashboard/statistics/`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStatistics {
    #[serde(default, deserialize_with = "deserialize_i64_from_number_or_default")]
    pub template_count: i64,
    #[serde(default, deserialize_with = "deserialize_i64_from_number_or_default")]
    pub category_count: i64,
    #[serde(default, deserialize_with = "deserialize_i64_from_number_or_default")]
    pub knowledge_base_count: i64,
    #[serde(default, deserialize_with = "deserialize_i64_from_number_or_default")]
    pub document_count: i64,
    #[serde(default)]
    pub system_status: SystemStatus,
    #[serde(default)]
    pub api_calls: ApiCallCounts,
    #[serde(default)]
    pub recent_activities: Vec<RecentActivity>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub model_status: Option<String>,
    #[serde(default)]
    pub api_status: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCallCounts {
    #[serde(default, deserialize_with = "deserialize_i64_from_number_or_default")]
    pub today: i64,
    #[serde(default, deserialize_with = "deserialize_i64_from_number_or_default")]
    pub total: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub title: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

// =============================================================================
// NUMBER HELPERS
// =============================================================================

fn deserialize_i64_from_number_or_default<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(0),
        Some(value) => i64_from_value(value).map_err(D::Error::custom),
    }
}

fn deserialize_i64_from_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    i64_from_value(value).map_err(D::Error::custom)
}

fn i64_from_value(value: serde_json::Value) -> Result<i64, &'static str> {
    match value {
        serde_json::Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(int);
            }
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            if let Some(float) = number.as_f64()
                && float.is_finite()
                && float.fract() == 0.0
                && float >= i64::MIN as f64
                && float <= i64::MAX as f64
            {
                return Ok(float as i64);
            }
            Err("expected integer-compatible number")
        }
        serde_json::Value::String(raw) => raw.trim().parse::<i64>().map_err(|_| "expected integer string"),
        _ => Err("expected number"),
    }
}
