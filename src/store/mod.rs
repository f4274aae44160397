pub mod db;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;
use sqlx::postgres::PgRow;

/// One ingested news entry. `url` is the dedup key; `topic`, `summary`,
/// `opinion`, `image_url` and `sent_at` start NULL and are each written by
/// exactly one pipeline stage (classify, enrich, enrich, enrich, record).
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub item_id: i64,
    pub url: String,
    pub title: String,
    pub source: String,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub opinion: Option<String>,
    pub image_url: Option<String>,
    pub topic: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn is_enriched(&self) -> bool {
        self.summary.is_some()
    }
}

/// Append-only log row marking that a topic's digest went out.
#[derive(Debug, Clone, Serialize)]
pub struct DigestRecord {
    pub digest_id: i64,
    pub topic: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Subscriber {
    pub subscriber_id: i64,
    pub email: String,
    pub confirm_token: String,
    pub confirmed: bool,
    pub subscribed_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

/// Per-topic view the rotation selector works from: how many unsent items
/// carry the topic and when it last headlined a digest (None = never).
#[derive(Debug, Clone, Serialize)]
pub struct TopicInventory {
    pub topic: String,
    pub unsent: i64,
    pub last_sent_at: Option<DateTime<Utc>>,
}

pub(crate) fn item_from_row(row: &PgRow) -> Item {
    Item {
        item_id: row.get("item_id"),
        url: row.get("url"),
        title: row.get("title"),
        source: row.get("source"),
        content: row.get("content"),
        summary: row.get("summary"),
        opinion: row.get("opinion"),
        image_url: row.get("image_url"),
        topic: row.get("topic"),
        fetched_at: row.get("fetched_at"),
        sent_at: row.get("sent_at"),
    }
}
