//! HTTP client adapter for the admin backend.
//!
//! ARCHITECTURE
//! ============
//! Every gateway call goes through one `HttpClient`: it joins paths onto the
//! configured API root, sends credential cookies from a shared jar on every
//! request, and hands each failed response to the registered
//! [`ResponseInterceptor`]s before returning the error to the caller.
//!
//! ERROR HANDLING
//! ==============
//! Failures are classified once here (`Unauthorized`, `Status`, `Network`,
//! `Decode`) so the session store can branch on the variant instead of
//! re-inspecting status codes.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{ConsoleConfig, HttpTimeouts};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by gateway calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The backend answered 401: the session is missing or expired.
    #[error("unauthorized")]
    Unauthorized,

    /// The backend answered with another non-success status.
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response (connect, timeout, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not have the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The configured API root is not a valid absolute URL.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// HTTP status carried by the error, if the backend answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(StatusCode::UNAUTHORIZED.as_u16()),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// =============================================================================
// INTERCEPTORS
// =============================================================================

/// Observer for failed responses, run before the error reaches the caller.
pub trait ResponseInterceptor: Send + Sync {
    fn on_error(&self, path: &str, error: &ApiError);
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpClient {
    http: reqwest::Client,
    api_url: String,
    origin: Url,
    jar: Arc<Jar>,
    interceptors: RwLock<Vec<Arc<dyn ResponseInterceptor>>>,
}

impl HttpClient {
    /// Build a client rooted at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_url` is not an absolute URL or the HTTP client fails to build.
    pub fn new(api_url: &str, timeouts: HttpTimeouts) -> Result<Self, ApiError> {
        let api_url = api_url.trim_end_matches('/').to_owned();
        let origin = Url::parse(&api_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{api_url}: {e}")))?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;

        Ok(Self { http, api_url, origin, jar, interceptors: RwLock::new(Vec::new()) })
    }

    /// Build a client from parsed console config.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::new`].
    pub fn from_config(config: &ConsoleConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_url, config.timeouts)
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Register an interceptor; it sees every failed response from now on.
    pub fn add_interceptor(&self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.interceptors.write().push(interceptor);
    }

    /// Absolute URL for a gateway path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        join_url(&self.api_url, path)
    }

    // -------------------------------------------------------------------------
    // Cookies
    // -------------------------------------------------------------------------

    /// Cookie header the jar would send to the API root, if any.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        let value = self.jar.cookies(&self.origin)?;
        value.to_str().map(str::to_owned).ok()
    }

    /// Seed the jar from a header produced by [`HttpClient::cookie_header`].
    pub fn restore_cookies(&self, header: &str) {
        for pair in split_cookie_header(header) {
            self.jar.add_cookie_str(&format!("{pair}; Path=/"), &self.origin);
        }
    }

    // -------------------------------------------------------------------------
    // Requests
    // -------------------------------------------------------------------------

    /// `GET path`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures, non-success statuses, or bad bodies.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(path, self.builder(Method::GET, path)).await
    }

    /// `GET path` with query parameters.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(path, self.builder(Method::GET, path).query(query))
            .await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(path, self.builder(Method::POST, path).json(body))
            .await
    }

    /// `POST path` without a body (action endpoints).
    ///
    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(path, self.builder(Method::POST, path)).await
    }

    /// `POST path` with a multipart form.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        self.send(path, self.builder(Method::POST, path).multipart(form))
            .await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(path, self.builder(Method::PUT, path).json(body))
            .await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(path, self.builder(Method::DELETE, path)).await
    }

    fn builder(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.endpoint(path))
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, builder: RequestBuilder) -> Result<T, ApiError> {
        let result = execute(builder).await;
        if let Err(error) = &result {
            tracing::warn!(%path, %error, "api request failed");
            self.notify(path, error);
        }
        result
    }

    fn notify(&self, path: &str, error: &ApiError) {
        // Clone out so interceptors may register others or issue requests.
        let interceptors = self.interceptors.read().clone();
        for interceptor in interceptors {
            interceptor.on_error(path, error);
        }
    }
}

async fn execute<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
    let response = builder
        .send()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;

    check_status(status, &text)?;
    decode_body(&text)
}

// =============================================================================
// PURE HELPERS
// =============================================================================

fn join_url(api_url: &str, path: &str) -> String {
    let base = api_url.trim_end_matches('/');
    if path.is_empty() {
        return base.to_owned();
    }
    if path.starts_with('/') { format!("{base}{path}") } else { format!("{base}/{path}") }
}

fn split_cookie_header(header: &str) -> impl Iterator<Item = &str> {
    header
        .split(';')
        .map(str::trim)
        .filter(|pair| pair.contains('='))
}

fn check_status(status: StatusCode, body: &str) -> Result<(), ApiError> {
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    let message = error_message(body)
        .or_else(|| status.canonical_reason().map(str::to_owned))
        .unwrap_or_else(|| "request failed".to_owned());
    Err(ApiError::Status { status: status.as_u16(), message })
}

/// Pull a human-readable message out of an error body (`error`, `message`, or DRF's `detail`).
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message", "detail"]
        .iter()
        .find_map(|key| value.get(*key).and_then(serde_json::Value::as_str))
        .map(str::to_owned)
}

/// Decode a success body; empty bodies (204 replies) decode as `{}`.
fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let text = if text.trim().is_empty() { "{}" } else { text };
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}
