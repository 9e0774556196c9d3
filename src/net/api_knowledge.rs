//! Knowledge-base, chunk, and prompt-template calls.

#[cfg(test)]
#[path = "api_knowledge_test.rs"]
mod api_knowledge_test;

use std::path::Path;
use std::sync::Arc;

use super::http::{ApiError, HttpClient};
use super::types::{ActionReply, KnowledgeBase, KnowledgeChunk, PromptCategory, PromptTemplate, RecordId, TemplateBatch};
use super::{detail_action_path, detail_path, list_action_path};

const KNOWLEDGE_PATH: &str = "/v1/knowledge/";
const CHUNKS_PATH: &str = "/v1/chunks/";
const TEMPLATES_PATH: &str = "/v1/templates/";

// =============================================================================
// KNOWLEDGE BASES
// =============================================================================

#[derive(Clone)]
pub struct KnowledgeApi {
    http: Arc<HttpClient>,
}

impl KnowledgeApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn list(&self) -> Result<Vec<KnowledgeBase>, ApiError> {
        self.http.get(KNOWLEDGE_PATH).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn get(&self, id: RecordId) -> Result<KnowledgeBase, ApiError> {
        self.http.get(&detail_path(KNOWLEDGE_PATH, id)).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn create(&self, knowledge_base: &serde_json::Value) -> Result<KnowledgeBase, ApiError> {
        self.http.post(KNOWLEDGE_PATH, knowledge_base).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn update(&self, id: RecordId, knowledge_base: &serde_json::Value) -> Result<KnowledgeBase, ApiError> {
        self.http
            .put(&detail_path(KNOWLEDGE_PATH, id), knowledge_base)
            .await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn delete(&self, id: RecordId) -> Result<ActionReply, ApiError> {
        self.http.delete(&detail_path(KNOWLEDGE_PATH, id)).await
    }

    /// Import every markdown file in a server-side directory.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn import_directory(&self, directory: &str) -> Result<ActionReply, ApiError> {
        let body = serde_json::json!({ "directory": directory });
        self.http
            .post(&list_action_path(KNOWLEDGE_PATH, "import_directory"), &body)
            .await
    }

    /// Upload a local file as a new knowledge base (multipart field `file`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the file cannot be read, or any request error.
    pub async fn upload(&self, file: &Path) -> Result<ActionReply, ApiError> {
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|e| ApiError::Network(format!("read {}: {e}", file.display())))?;
        let file_name = file
            .file_name()
            .map_or_else(|| "upload".to_owned(), |name| name.to_string_lossy().into_owned());
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);
        self.http
            .post_multipart(&list_action_path(KNOWLEDGE_PATH, "upload"), form)
            .await
    }

    /// Vectorize a knowledge base.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn index(&self, id: RecordId) -> Result<ActionReply, ApiError> {
        self.http
            .post_empty(&detail_action_path(KNOWLEDGE_PATH, id, "index"))
            .await
    }
}

// =============================================================================
// CHUNKS
// =============================================================================

#[derive(Clone)]
pub struct ChunksApi {
    http: Arc<HttpClient>,
}

impl ChunksApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// List chunks, optionally only those of one knowledge base.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn list(&self, knowledge_base: Option<RecordId>) -> Result<Vec<KnowledgeChunk>, ApiError> {
        match knowledge_base {
            Some(id) => {
                self.http
                    .get_with_query(CHUNKS_PATH, &[("knowledge_base", id)])
                    .await
            }
            None => self.http.get(CHUNKS_PATH).await,
        }
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn get(&self, id: RecordId) -> Result<KnowledgeChunk, ApiError> {
        self.http.get(&detail_path(CHUNKS_PATH, id)).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn create(&self, chunk: &serde_json::Value) -> Result<KnowledgeChunk, ApiError> {
        self.http.post(CHUNKS_PATH, chunk).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn update(&self, id: RecordId, chunk: &serde_json::Value) -> Result<KnowledgeChunk, ApiError> {
        self.http.put(&detail_path(CHUNKS_PATH, id), chunk).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn delete(&self, id: RecordId) -> Result<ActionReply, ApiError> {
        self.http.delete(&detail_path(CHUNKS_PATH, id)).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn vectorize(&self, id: RecordId) -> Result<ActionReply, ApiError> {
        self.http
            .post_empty(&detail_action_path(CHUNKS_PATH, id, "vectorize"))
            .await
    }
}

// =============================================================================
// PROMPT TEMPLATES
// =============================================================================

#[derive(Clone)]
pub struct TemplatesApi {
    http: Arc<HttpClient>,
}

impl TemplatesApi {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn list(&self) -> Result<Vec<PromptTemplate>, ApiError> {
        self.http.get(TEMPLATES_PATH).await
    }

    /// Templates grouped by the category prefix of their dotted names.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn categories(&self) -> Result<Vec<PromptCategory>, ApiError> {
        self.http
            .get(&list_action_path(TEMPLATES_PATH, "categories"))
            .await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn get(&self, id: RecordId) -> Result<PromptTemplate, ApiError> {
        self.http.get(&detail_path(TEMPLATES_PATH, id)).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn create(&self, template: &serde_json::Value) -> Result<PromptTemplate, ApiError> {
        self.http.post(TEMPLATES_PATH, template).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn update(&self, id: RecordId, template: &serde_json::Value) -> Result<PromptTemplate, ApiError> {
        self.http
            .put(&detail_path(TEMPLATES_PATH, id), template)
            .await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn delete(&self, id: RecordId) -> Result<ActionReply, ApiError> {
        self.http.delete(&detail_path(TEMPLATES_PATH, id)).await
    }

    /// Drop the backend's in-memory template cache.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn refresh_cache(&self) -> Result<ActionReply, ApiError> {
        self.http
            .post_empty(&list_action_path(TEMPLATES_PATH, "refresh_cache"))
            .await
    }

    /// Restore the default template set.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn reset(&self) -> Result<ActionReply, ApiError> {
        self.http
            .post_empty(&list_action_path(TEMPLATES_PATH, "reset"))
            .await
    }

    /// Replace template contents in bulk.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    pub async fn batch_update(&self, templates: &TemplateBatch) -> Result<ActionReply, ApiError> {
        self.http
            .post(&list_action_path(TEMPLATES_PATH, "batch_update"), templates)
            .await
    }
}
