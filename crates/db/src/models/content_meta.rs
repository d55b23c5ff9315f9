use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Owner domain of a counter record. Only used for categorization.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display,
)]
#[sqlx(type_name = "content_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[ts(export)]
pub enum ContentType {
    Site,
    Blog,
    Project,
    Story,
}

/// View counter for a single slug
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContentMeta {
    pub id: Uuid,
    pub slug: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentMeta {
    /// Current view count for `slug`. A slug that was never incremented reads as 0.
    pub async fn views(pool: &SqlitePool, slug: &str) -> Result<i64, sqlx::Error> {
        let views = sqlx::query_scalar::<_, i64>(r#"SELECT views FROM content_meta WHERE slug = $1"#)
            .bind(slug)
            .fetch_optional(pool)
            .await?;

        Ok(views.unwrap_or(0))
    }

    /// Atomically bump the counter for `slug`, creating it at 1 if absent.
    ///
    /// This is one statement so concurrent callers never read-modify-write a
    /// stale value. The stored `type` of an existing record is left untouched.
    pub async fn increment(
        pool: &SqlitePool,
        slug: &str,
        content_type: ContentType,
    ) -> Result<i64, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO content_meta (id, slug, type, views)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT(slug) DO UPDATE SET
                views = views + 1,
                updated_at = datetime('now', 'subsec')
            RETURNING views"#,
        )
        .bind(id)
        .bind(slug)
        .bind(content_type)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ContentMeta>(
            r#"SELECT id, slug, type, views, created_at, updated_at
            FROM content_meta
            WHERE slug = $1"#,
        )
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    /// All records of one type, most viewed first
    pub async fn find_by_type(
        pool: &SqlitePool,
        content_type: ContentType,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ContentMeta>(
            r#"SELECT id, slug, type, views, created_at, updated_at
            FROM content_meta
            WHERE type = $1
            ORDER BY views DESC, slug ASC"#,
        )
        .bind(content_type)
        .fetch_all(pool)
        .await
    }
}
