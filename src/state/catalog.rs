//! Cached lists shared across views: prompt templates, template categories,
//! and knowledge bases.
//!
//! ERROR HANDLING
//! ==============
//! A failed fetch is logged and returned; the cached list keeps its previous
//! contents. After a successful delete the knowledge-base list is refetched,
//! and a failed refetch is only logged since the delete itself succeeded.

#[cfg(test)]
#[path = "catalog_test.rs"]
mod catalog_test;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::net::api_knowledge::{KnowledgeApi, TemplatesApi};
use crate::net::http::{ApiError, HttpClient};
use crate::net::types::{ActionReply, KnowledgeBase, PromptCategory, PromptTemplate, RecordId};

/// Backend calls the catalog depends on.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn prompt_templates(&self) -> Result<Vec<PromptTemplate>, ApiError>;
    async fn prompt_categories(&self) -> Result<Vec<PromptCategory>, ApiError>;
    async fn knowledge_bases(&self) -> Result<Vec<KnowledgeBase>, ApiError>;
    async fn delete_knowledge_base(&self, id: RecordId) -> Result<ActionReply, ApiError>;
}

/// [`CatalogSource`] over the template and knowledge gateways.
pub struct CatalogApi {
    templates: TemplatesApi,
    knowledge: KnowledgeApi,
}

impl CatalogApi {
    #[must_use]
    pub fn new(http: &Arc<HttpClient>) -> Self {
        Self { templates: TemplatesApi::new(Arc::clone(http)), knowledge: KnowledgeApi::new(Arc::clone(http)) }
    }
}

#[async_trait::async_trait]
impl CatalogSource for CatalogApi {
    async fn prompt_templates(&self) -> Result<Vec<PromptTemplate>, ApiError> {
        self.templates.list().await
    }

    async fn prompt_categories(&self) -> Result<Vec<PromptCategory>, ApiError> {
        self.templates.categories().await
    }

    async fn knowledge_bases(&self) -> Result<Vec<KnowledgeBase>, ApiError> {
        self.knowledge.list().await
    }

    async fn delete_knowledge_base(&self, id: RecordId) -> Result<ActionReply, ApiError> {
        self.knowledge.delete(id).await
    }
}

#[derive(Clone, Debug, Default)]
struct Cached {
    prompt_templates: Vec<PromptTemplate>,
    prompt_categories: Vec<PromptCategory>,
    knowledge_bases: Vec<KnowledgeBase>,
}

pub struct Catalog {
    source: Arc<dyn CatalogSource>,
    cached: RwLock<Cached>,
}

impl Catalog {
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self { source, cached: RwLock::new(Cached::default()) }
    }

    #[must_use]
    pub fn prompt_templates(&self) -> Vec<PromptTemplate> {
        self.cached.read().prompt_templates.clone()
    }

    #[must_use]
    pub fn prompt_categories(&self) -> Vec<PromptCategory> {
        self.cached.read().prompt_categories.clone()
    }

    #[must_use]
    pub fn knowledge_bases(&self) -> Vec<KnowledgeBase> {
        self.cached.read().knowledge_bases.clone()
    }

    /// # Errors
    ///
    /// Returns the gateway error; the cache is left as it was.
    pub async fn fetch_prompt_templates(&self) -> Result<Vec<PromptTemplate>, ApiError> {
        let templates = self
            .source
            .prompt_templates()
            .await
            .inspect_err(|error| tracing::warn!(%error, "fetching prompt templates failed"))?;
        self.cached.write().prompt_templates.clone_from(&templates);
        Ok(templates)
    }

    /// # Errors
    ///
    /// Returns the gateway error; the cache is left as it was.
    pub async fn fetch_prompt_categories(&self) -> Result<Vec<PromptCategory>, ApiError> {
        let categories = self
            .source
            .prompt_categories()
            .await
            .inspect_err(|error| tracing::warn!(%error, "fetching prompt categories failed"))?;
        self.cached.write().prompt_categories.clone_from(&categories);
        Ok(categories)
    }

    /// # Errors
    ///
    /// Returns the gateway error; the cache is left as it was.
    pub async fn fetch_knowledge_bases(&self) -> Result<Vec<KnowledgeBase>, ApiError> {
        let knowledge_bases = self
            .source
            .knowledge_bases()
            .await
            .inspect_err(|error| tracing::warn!(%error, "fetching knowledge bases failed"))?;
        self.cached.write().knowledge_bases.clone_from(&knowledge_bases);
        Ok(knowledge_bases)
    }

    /// Delete a knowledge base, then refresh the cached list.
    ///
    /// # Errors
    ///
    /// Returns the delete error. Refetch failures are logged only.
    pub async fn delete_knowledge_base(&self, id: RecordId) -> Result<ActionReply, ApiError> {
        let reply = self
            .source
            .delete_knowledge_base(id)
            .await
            .inspect_err(|error| tracing::warn!(knowledge_base_id = id, %error, "deleting knowledge base failed"))?;
        if self.fetch_knowledge_bases().await.is_err() {
            tracing::debug!(knowledge_base_id = id, "knowledge base list is stale after delete");
        }
        Ok(reply)
    }
}
