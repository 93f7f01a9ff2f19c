//! Persistence and collection ordering for Folio.
//!
//! This crate provides:
//! - The ordered collection indexer (dense per-owner positions)
//! - Attachment reconciliation by URL identity
//! - The collection metadata side-channel on user profiles
//! - SQLite and PostgreSQL stores with per-operation transactions

pub mod error;
pub mod indexer;
pub mod models;
pub mod postgres;
pub mod reconcile;
pub mod repos;
pub mod service;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{StoreError, StoreResult};
pub use models::{AttachmentRow, PositionedItem, Profile, ProfileUpdate};
pub use postgres::PostgresStore;
pub use service::{CollectionEntry, CollectionService};
pub use store::{PortfolioStore, SqliteStore, StoreTx};

use folio_core::config::DatabaseConfig;
use std::sync::Arc;

/// Create a portfolio store from configuration.
pub async fn from_config(config: &DatabaseConfig) -> StoreResult<Arc<dyn PortfolioStore>> {
    match config {
        DatabaseConfig::Sqlite { path } => {
            tracing::info!(path = %path.display(), "Opening SQLite database");
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store) as Arc<dyn PortfolioStore>)
        }
        DatabaseConfig::Postgres {
            url,
            host,
            port,
            username,
            password,
            database,
            ssl_mode,
            max_connections,
            statement_timeout_ms,
        } => {
            let store = if let Some(url) = url {
                tracing::info!("Connecting to PostgreSQL using connection URL");
                PostgresStore::from_url(url, *max_connections, *statement_timeout_ms).await?
            } else if let (Some(host), Some(database)) = (host.as_ref(), database.as_ref()) {
                PostgresStore::from_params(
                    host,
                    port.unwrap_or(5432),
                    username.as_deref(),
                    password.as_deref(),
                    database,
                    *ssl_mode,
                    *max_connections,
                    *statement_timeout_ms,
                )
                .await?
            } else {
                return Err(StoreError::Config(
                    "postgres config requires either 'url' or 'host' + 'database'".to_string(),
                ));
            };
            Ok(Arc::new(store) as Arc<dyn PortfolioStore>)
        }
    }
}
