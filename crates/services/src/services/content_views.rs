//! Per-content view counters for blog posts, projects and stories.

use db::models::content_meta::{ContentMeta, ContentType};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use ts_rs::TS;

const MAX_SLUG_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum ContentViewsError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid slug: {0}")]
    InvalidSlug(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContentViews {
    pub slug: String,
    pub count: i64,
}

pub struct ContentViewsService;

impl ContentViewsService {
    pub async fn get(pool: &SqlitePool, slug: &str) -> Result<ContentViews, ContentViewsError> {
        validate_slug(slug)?;
        let count = ContentMeta::views(pool, slug).await?;
        Ok(ContentViews {
            slug: slug.to_string(),
            count,
        })
    }

    pub async fn record_view(
        pool: &SqlitePool,
        slug: &str,
        content_type: ContentType,
    ) -> Result<ContentViews, ContentViewsError> {
        validate_slug(slug)?;
        let count = ContentMeta::increment(pool, slug, content_type).await?;
        Ok(ContentViews {
            slug: slug.to_string(),
            count,
        })
    }

    pub async fn list(
        pool: &SqlitePool,
        content_type: ContentType,
    ) -> Result<Vec<ContentMeta>, ContentViewsError> {
        Ok(ContentMeta::find_by_type(pool, content_type).await?)
    }
}

/// Slugs are URL path segments: 1..=200 chars of `[A-Za-z0-9_-]`.
pub fn validate_slug(slug: &str) -> Result<(), ContentViewsError> {
    if slug.is_empty() {
        return Err(ContentViewsError::InvalidSlug("slug is empty".to_string()));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(ContentViewsError::InvalidSlug(format!(
            "slug is longer than {MAX_SLUG_LEN} characters"
        )));
    }
    if let Some(bad) = slug
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(ContentViewsError::InvalidSlug(format!(
            "unexpected character {bad:?}"
        )));
    }
    Ok(())
}
