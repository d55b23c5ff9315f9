//! Schema check used by the health endpoint and at startup.

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

/// Tables the counter endpoints cannot work without
pub const REQUIRED_TABLES: &[&str] = &["content_meta"];

#[derive(Debug, Error)]
pub enum DatabaseValidationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct DatabaseValidator {
    pool: SqlitePool,
}

impl DatabaseValidator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Check that migrations ran and every required table is present
    pub async fn validate(&self) -> Result<ValidationResult, DatabaseValidationError> {
        if !self.table_exists("_sqlx_migrations").await? {
            warn!("Database not initialized - _sqlx_migrations table does not exist");
            return Ok(ValidationResult {
                is_initialized: false,
                migrations_applied: 0,
                missing_tables: REQUIRED_TABLES.iter().map(|t| t.to_string()).collect(),
            });
        }

        let migrations_applied = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        let missing_tables = self.missing_tables(REQUIRED_TABLES).await?;
        if !missing_tables.is_empty() {
            warn!(missing = ?missing_tables, "Database is missing required tables");
        }

        info!(migrations_applied, "Database validation complete");

        Ok(ValidationResult {
            is_initialized: true,
            migrations_applied: migrations_applied as usize,
            missing_tables,
        })
    }

    pub async fn missing_tables(
        &self,
        required_tables: &[&str],
    ) -> Result<Vec<String>, DatabaseValidationError> {
        let mut missing = Vec::new();
        for table in required_tables {
            if !self.table_exists(table).await? {
                missing.push(table.to_string());
            }
        }
        Ok(missing)
    }

    async fn table_exists(&self, table: &str) -> Result<bool, DatabaseValidationError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_initialized: bool,
    pub migrations_applied: usize,
    pub missing_tables: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.is_initialized && self.missing_tables.is_empty()
    }

    pub fn summary(&self) -> String {
        if !self.is_initialized {
            "No migrations recorded; counter schema was never created".to_string()
        } else if !self.missing_tables.is_empty() {
            format!(
                "Counter storage incomplete, missing: {}",
                self.missing_tables.join(", ")
            )
        } else {
            format!(
                "Counter schema ready ({} migrations)",
                self.migrations_applied
            )
        }
    }
}
