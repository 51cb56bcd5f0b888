use std::sync::Arc;

use crate::{
    config::{Config, SessionBackend, StoreBackend},
    db::{self, InMemoryMembershipStore, MembershipStore, PgMembershipStore},
    services::{
        CatalogProvider, HeaderSessionProvider, ListService, RemoteSessionProvider,
        SessionProvider, TmdbProvider,
    },
};

/// Shared application state
///
/// Only handles to collaborators; no per-user data lives here.
#[derive(Clone)]
pub struct AppState {
    pub lists: ListService,
    pub sessions: Arc<dyn SessionProvider>,
    /// `None` when no catalog API key is configured
    pub catalog: Option<Arc<dyn CatalogProvider>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn MembershipStore>,
        sessions: Arc<dyn SessionProvider>,
        catalog: Option<Arc<dyn CatalogProvider>>,
    ) -> Self {
        Self {
            lists: ListService::new(store),
            sessions,
            catalog,
        }
    }

    /// Wires up the configured store, session provider and catalog
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn MembershipStore> = match config.store_backend {
            StoreBackend::Postgres => {
                let pool =
                    db::create_pool(&config.database_url, config.database_max_connections).await?;
                db::run_migrations(&pool).await?;
                Arc::new(PgMembershipStore::new(pool))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; lists are lost on restart");
                Arc::new(InMemoryMembershipStore::new())
            }
        };

        let sessions: Arc<dyn SessionProvider> = match config.session_backend {
            SessionBackend::Header => {
                Arc::new(HeaderSessionProvider::new(config.session_header.clone()))
            }
            SessionBackend::Remote => {
                let auth_url = config
                    .auth_url
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("AUTH_URL is required for remote sessions"))?;
                Arc::new(RemoteSessionProvider::new(auth_url))
            }
        };

        let catalog = config.tmdb_api_key.clone().map(|api_key| {
            Arc::new(TmdbProvider::new(
                api_key,
                config.tmdb_api_url.clone(),
                config.tmdb_image_base_url.clone(),
                config.tmdb_language.clone(),
            )) as Arc<dyn CatalogProvider>
        });

        if catalog.is_none() {
            tracing::warn!("TMDB_API_KEY not set; catalog search is disabled");
        }

        tracing::info!(
            store = ?config.store_backend,
            sessions = sessions.name(),
            "Application state initialized"
        );

        Ok(Self::new(store, sessions, catalog))
    }
}
