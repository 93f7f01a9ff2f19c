//! Application state shared across handlers.

use crate::auth::TokenVerifier;
use folio_core::config::AppConfig;
use folio_store::{CollectionService, PortfolioStore};
use std::sync::Arc;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Collection, attachment and profile operations.
    pub collections: CollectionService,
    /// Bearer token verifier.
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: AppConfig, store: Arc<dyn PortfolioStore>) -> Self {
        let verifier = TokenVerifier::new(&config.auth);
        Self {
            config: Arc::new(config),
            collections: CollectionService::new(store),
            verifier: Arc::new(verifier),
        }
    }

    pub fn store(&self) -> &Arc<dyn PortfolioStore> {
        self.collections.store()
    }
}
