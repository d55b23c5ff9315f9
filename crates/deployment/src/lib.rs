use async_trait::async_trait;
use db::DBService;
use services::services::{
    config::{Config, ConfigError},
    database_validator::DatabaseValidationError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] DatabaseValidationError),
    #[error("database schema invalid: {0}")]
    Schema(String),
}

/// Everything a request handler needs, constructed once at startup and
/// cloned into each request.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new() -> Result<Self, DeploymentError>;

    fn db(&self) -> &DBService;

    fn config(&self) -> &Config;

    /// Slug of the site-wide visitor counter
    fn visitor_slug(&self) -> &str {
        &self.config().visitor_slug
    }
}
