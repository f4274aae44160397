use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

// Deletes are bounded by `max` so a long-neglected table drains over a few
// runs instead of one giant transaction.

pub async fn delete_old_items(pool: &PgPool, cutoff: DateTime<Utc>, max: i64) -> Result<u64> {
    let res = sqlx::query(
        r#"
        DELETE FROM newsy.item
        WHERE item_id IN (
            SELECT item_id FROM newsy.item
            WHERE fetched_at < $1
            ORDER BY fetched_at
            LIMIT $2
        )
        "#,
    )
    .bind(cutoff)
    .bind(max)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

pub async fn delete_old_digest_records(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
    max: i64,
) -> Result<u64> {
    let res = sqlx::query(
        r#"
        DELETE FROM newsy.digest_record
        WHERE digest_id IN (
            SELECT digest_id FROM newsy.digest_record
            WHERE sent_at < $1
            ORDER BY sent_at
            LIMIT $2
        )
        "#,
    )
    .bind(cutoff)
    .bind(max)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}
