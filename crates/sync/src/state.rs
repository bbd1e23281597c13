//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::SyncConfig;
use crate::shopify::{ShopifyClient, ShopifyError};
use crate::sync::{CustomerDirectory, SyncService, SyncSettings};

/// Application state shared across all handlers.
///
/// Cheap to clone; the configuration and service live behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SyncConfig,
    service: SyncService,
}

impl AppState {
    /// Build state over any customer directory.
    #[must_use]
    pub fn new(config: SyncConfig, directory: Arc<dyn CustomerDirectory>) -> Self {
        let service = SyncService::new(directory, SyncSettings::from(&config));

        Self {
            inner: Arc::new(AppStateInner { config, service }),
        }
    }

    /// Build state backed by the Shopify Admin API.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn from_config(config: SyncConfig) -> Result<Self, ShopifyError> {
        let client = ShopifyClient::new(&config.shopify)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// The sync pipeline.
    #[must_use]
    pub fn sync_service(&self) -> &SyncService {
        &self.inner.service
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("service", &self.inner.service)
            .finish()
    }
}
