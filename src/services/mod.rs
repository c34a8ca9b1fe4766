//! Business logic services

pub mod auth;
pub mod catalog;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

pub use auth::AuthService;
pub use catalog::{Catalog, Inconsistency};

/// Container for all services
pub struct Services {
    pub catalog: Catalog<Repository>,
    pub auth: AuthService,
}

impl Services {
    /// Open the store, load the catalog and seed credentials
    pub async fn open(config: &AppConfig) -> AppResult<Self> {
        let repository = Repository::open(&config.database, &config.catalog).await?;
        let auth = AuthService::new(repository.credentials(), config.auth.clone());

        // Loading creates the schema, credentials included
        let catalog = Catalog::open(repository).await?;
        auth.bootstrap().await?;

        Ok(Self { catalog, auth })
    }

    pub async fn close(self) {
        self.catalog.close().await;
    }
}
