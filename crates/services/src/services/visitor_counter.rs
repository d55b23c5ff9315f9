//! Site-wide visitor counter backed by a single well-known `content_meta` row.

use db::models::content_meta::{ContentMeta, ContentType};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;
use ts_rs::TS;

#[derive(Debug, Error)]
pub enum VisitorCounterError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Wire shape of both visitor endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VisitorCount {
    pub count: i64,
}

pub struct VisitorCounterService;

impl VisitorCounterService {
    /// Read the current total without side effects
    pub async fn current(pool: &SqlitePool, slug: &str) -> Result<VisitorCount, VisitorCounterError> {
        let count = ContentMeta::views(pool, slug).await?;
        Ok(VisitorCount { count })
    }

    /// Count one more visit and return the new total
    pub async fn record_visit(
        pool: &SqlitePool,
        slug: &str,
    ) -> Result<VisitorCount, VisitorCounterError> {
        let count = ContentMeta::increment(pool, slug, ContentType::Site).await?;
        debug!(slug = %slug, count, "Visitor recorded");
        Ok(VisitorCount { count })
    }
}
