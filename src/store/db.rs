use anyhow::Result;
use sqlx::{PgPool, Row};

use super::{DigestRecord, Item, Subscriber, TopicInventory, item_from_row};

// Items that have not been classified yet; oldest first so the backlog
// drains in arrival order.
pub async fn list_unclassified_items(pool: &PgPool, limit: Option<i64>) -> Result<Vec<Item>> {
    let rows = sqlx::query(
        r#"
        SELECT item_id, url, title, source, content, summary, opinion, image_url, topic, fetched_at, sent_at
        FROM newsy.item
        WHERE topic IS NULL
        ORDER BY fetched_at ASC
        LIMIT $1
        "#,
    )
    .bind(limit.unwrap_or(i64::MAX))
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(item_from_row).collect())
}

// The unsent pool, newest first, optionally narrowed to one topic.
pub async fn list_unsent_items(pool: &PgPool, topic: Option<&str>) -> Result<Vec<Item>> {
    let rows = sqlx::query(
        r#"
        SELECT item_id, url, title, source, content, summary, opinion, image_url, topic, fetched_at, sent_at
        FROM newsy.item
        WHERE sent_at IS NULL
          AND topic IS NOT NULL
          AND ($1::text IS NULL OR topic = $1)
        ORDER BY fetched_at DESC
        "#,
    )
    .bind(topic)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(item_from_row).collect())
}

// Every distinct topic present on unsent items, with its unsent count and
// the timestamp of its most recent digest (NULL when it never headlined).
pub async fn list_topics_with_unsent_count(pool: &PgPool) -> Result<Vec<TopicInventory>> {
    let rows = sqlx::query(
        r#"
        SELECT i.topic,
               COUNT(*) AS unsent,
               d.last_sent_at
        FROM newsy.item i
        LEFT JOIN (
            SELECT topic, MAX(sent_at) AS last_sent_at
            FROM newsy.digest_record
            GROUP BY topic
        ) d ON d.topic = i.topic
        WHERE i.sent_at IS NULL
          AND i.topic IS NOT NULL
        GROUP BY i.topic, d.last_sent_at
        ORDER BY i.topic
        "#,
    )
    .fetch_all(pool)
    .await?;

    let inventories = rows
        .into_iter()
        .map(|row| TopicInventory {
            topic: row.get("topic"),
            unsent: row.get("unsent"),
            last_sent_at: row.get("last_sent_at"),
        })
        .collect();
    Ok(inventories)
}

pub async fn list_digest_records(
    pool: &PgPool,
    topic: Option<&str>,
    limit: i64,
) -> Result<Vec<DigestRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT digest_id, topic, sent_at
        FROM newsy.digest_record
        WHERE ($1::text IS NULL OR topic = $1)
        ORDER BY sent_at DESC
        LIMIT $2
        "#,
    )
    .bind(topic)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let records = rows
        .into_iter()
        .map(|row| DigestRecord {
            digest_id: row.get("digest_id"),
            topic: row.get("topic"),
            sent_at: row.get("sent_at"),
        })
        .collect();
    Ok(records)
}

// Confirmed subscribers who have not opted out.
pub async fn list_active_subscribers(pool: &PgPool) -> Result<Vec<Subscriber>> {
    let rows = sqlx::query(
        r#"
        SELECT subscriber_id, email, confirm_token, confirmed, subscribed_at, unsubscribed_at
        FROM newsy.subscriber
        WHERE confirmed = TRUE AND unsubscribed_at IS NULL
        ORDER BY subscriber_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(subscriber_from_row).collect())
}

pub(crate) fn subscriber_from_row(row: &sqlx::postgres::PgRow) -> Subscriber {
    Subscriber {
        subscriber_id: row.get("subscriber_id"),
        email: row.get("email"),
        confirm_token: row.get("confirm_token"),
        confirmed: row.get("confirmed"),
        subscribed_at: row.get("subscribed_at"),
        unsubscribed_at: row.get("unsubscribed_at"),
    }
}
