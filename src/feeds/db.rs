use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Row};

#[derive(Debug, Clone, Serialize)]
pub struct FeedRow {
    pub feed_id: i32,
    pub url: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub added_at: DateTime<Utc>,
}

pub async fn upsert_feed(pool: &PgPool, url: &str, name: Option<&str>, active: bool) -> Result<bool> {
    let row = sqlx::query(
        r#"
        INSERT INTO newsy.feed (url, name, is_active)
        VALUES ($1, $2, $3)
        ON CONFLICT (url)
        DO UPDATE SET name = EXCLUDED.name, is_active = EXCLUDED.is_active
        RETURNING (xmax = 0) AS inserted
        "#,
    )
    .bind(url)
    .bind(name)
    .bind(active)
    .fetch_one(pool)
    .await?;
    Ok(row.get::<bool, _>("inserted"))
}

pub async fn list_feeds(pool: &PgPool, active: Option<bool>) -> Result<Vec<FeedRow>> {
    let rows = sqlx::query(
        r#"
        SELECT feed_id, url, name, is_active, added_at
        FROM newsy.feed
        WHERE ($1::bool IS NULL OR is_active = $1)
        ORDER BY feed_id
        "#,
    )
    .bind(active)
    .fetch_all(pool)
    .await?;

    let feeds = rows
        .into_iter()
        .map(|r| FeedRow {
            feed_id: r.get("feed_id"),
            url: r.get("url"),
            name: r.get("name"),
            is_active: r.get("is_active"),
            added_at: r.get("added_at"),
        })
        .collect();
    Ok(feeds)
}

// Active feeds for the fetch command, optionally narrowed to one feed.
pub async fn select_feeds_for_fetch(pool: &PgPool, feed: Option<i32>) -> Result<Vec<FeedRow>> {
    let rows = sqlx::query(
        r#"
        SELECT feed_id, url, name, is_active, added_at
        FROM newsy.feed
        WHERE ($1::int4 IS NULL OR feed_id = $1)
          AND ($1::int4 IS NOT NULL OR is_active = TRUE)
        ORDER BY feed_id
        "#,
    )
    .bind(feed)
    .fetch_all(pool)
    .await?;

    let feeds = rows
        .into_iter()
        .map(|r| FeedRow {
            feed_id: r.get("feed_id"),
            url: r.get("url"),
            name: r.get("name"),
            is_active: r.get("is_active"),
            added_at: r.get("added_at"),
        })
        .collect();
    Ok(feeds)
}
