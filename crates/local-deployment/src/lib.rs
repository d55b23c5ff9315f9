use std::sync::Arc;

use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use services::services::{config::Config, database_validator::DatabaseValidator};
use tracing::info;

#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<Config>,
    db: DBService,
}

impl LocalDeployment {
    /// Open the configured database and make sure its schema is usable.
    pub async fn from_config(config: Config) -> Result<Self, DeploymentError> {
        let db = DBService::new(&config.database_url).await?;

        let validation = DatabaseValidator::new(db.pool.clone()).validate().await?;
        if !validation.is_ok() {
            return Err(DeploymentError::Schema(validation.summary()));
        }
        info!("{}", validation.summary());

        Ok(Self::from_parts(config, db))
    }

    /// Assemble from already opened pieces.
    pub fn from_parts(config: Config, db: DBService) -> Self {
        Self {
            config: Arc::new(config),
            db,
        }
    }
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        let config = Config::from_env()?;
        Self::from_config(config).await
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn config(&self) -> &Config {
        &self.config
    }
}
