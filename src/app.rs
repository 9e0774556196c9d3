//! The console context: every long-lived piece, built once and wired together.
//!
//! SYSTEM CONTEXT
//! ==============
//! Front ends (the CLI, integration tests) construct one [`Console`] and reach
//! the session store, navigator, catalog, and gateways through it. There are
//! no process-wide singletons.
//!
//! ARCHITECTURE
//! ============
//! ```text
//! HttpClient ──► AuthApi ──► SessionStore ──► RouteGuard ──► Navigator
//!     ▲                          │                              │
//!     └──── UnauthRedirect ◄─────┴──── Session ◄────────────────┘ (weak)
//! ```
//! The interceptor holds the session cell and a weak navigator handle, so
//! the client and the navigator never keep each other alive.

use std::sync::Arc;

use crate::config::ConsoleConfig;
use crate::net::api::{AuthApi, AuthGateway, UsersApi};
use crate::net::api_admin::{ApiKeysApi, EndpointsApi};
use crate::net::api_knowledge::{ChunksApi, KnowledgeApi, TemplatesApi};
use crate::net::api_ops::{DashboardApi, ModelsApi, ServicesApi};
use crate::net::http::{ApiError, HttpClient};
use crate::router::RouteTable;
use crate::router::guard::RouteGuard;
use crate::router::navigator::Navigator;
use crate::state::auth::{Session, SessionStore};
use crate::state::catalog::{Catalog, CatalogApi};
use crate::state::storage::{COOKIES_KEY, DurableStore, FileStore, load_json, remove_key, save_json};
use crate::util::auth::install_unauth_redirect;

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct Console {
    http: Arc<HttpClient>,
    store: Arc<dyn DurableStore>,
    sessions: SessionStore,
    navigator: Arc<Navigator>,
    catalog: Catalog,
}

impl Console {
    /// Build a console persisting to `config.state_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Api`] if the HTTP client cannot be built.
    pub fn new(config: &ConsoleConfig) -> Result<Self, ConsoleError> {
        Self::with_store(config, Arc::new(FileStore::new(&config.state_dir)))
    }

    /// Build a console over an explicit durable store.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Api`] if the HTTP client cannot be built.
    pub fn with_store(config: &ConsoleConfig, store: Arc<dyn DurableStore>) -> Result<Self, ConsoleError> {
        let http = Arc::new(HttpClient::from_config(config)?);
        let gateway: Arc<dyn AuthGateway> = Arc::new(AuthApi::new(Arc::clone(&http)));
        Ok(Self::assemble(http, store, gateway))
    }

    /// Wire a console around an existing client and gateway.
    #[must_use]
    pub fn assemble(http: Arc<HttpClient>, store: Arc<dyn DurableStore>, gateway: Arc<dyn AuthGateway>) -> Self {
        if let Some(cookies) = load_json::<String>(store.as_ref(), COOKIES_KEY) {
            http.restore_cookies(&cookies);
        }

        let session = Arc::new(Session::new(Arc::clone(&store)));
        let sessions = SessionStore::new(Arc::clone(&session), gateway);
        let navigator = Arc::new(Navigator::new(RouteTable::admin_console(), RouteGuard::new(sessions.clone())));
        install_unauth_redirect(&http, session, &navigator);
        let catalog = Catalog::new(Arc::new(CatalogApi::new(&http)));

        tracing::debug!(api_url = %http.api_url(), "console assembled");
        Self { http, store, sessions, navigator, catalog }
    }

    #[must_use]
    pub fn http(&self) -> &Arc<HttpClient> {
        &self.http
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.navigator
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Mirror the jar's cookies to the durable store, or drop them when the jar is empty.
    pub fn persist_cookies(&self) {
        match self.http.cookie_header() {
            Some(header) => save_json(self.store.as_ref(), COOKIES_KEY, &header),
            None => remove_key(self.store.as_ref(), COOKIES_KEY),
        }
    }

    // -------------------------------------------------------------------------
    // Gateways
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn users(&self) -> UsersApi {
        UsersApi::new(Arc::clone(&self.http))
    }

    #[must_use]
    pub fn api_keys(&self) -> ApiKeysApi {
        ApiKeysApi::new(Arc::clone(&self.http))
    }

    #[must_use]
    pub fn endpoints(&self) -> EndpointsApi {
        EndpointsApi::new(Arc::clone(&self.http))
    }

    #[must_use]
    pub fn knowledge(&self) -> KnowledgeApi {
        KnowledgeApi::new(Arc::clone(&self.http))
    }

    #[must_use]
    pub fn chunks(&self) -> ChunksApi {
        ChunksApi::new(Arc::clone(&self.http))
    }

    #[must_use]
    pub fn models(&self) -> ModelsApi {
        ModelsApi::new(Arc::clone(&self.http))
    }

    #[must_use]
    pub fn templates(&self) -> TemplatesApi {
        TemplatesApi::new(Arc::clone(&self.http))
    }

    #[must_use]
    pub fn services(&self) -> ServicesApi {
        ServicesApi::new(Arc::clone(&self.http))
    }

    #[must_use]
    pub fn dashboard(&self) -> DashboardApi {
        DashboardApi::new(Arc::clone(&self.http))
    }
}
