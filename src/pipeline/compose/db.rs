use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

// This module is the only writer of the enrichment fields and of
// `sent_at`/digest records; other stages never touch them.

/// Persist one item's enrichment. Guarded on `summary IS NULL` so an
/// overlapping run that already enriched the item is left alone; the
/// item's own image is never overwritten.
pub async fn write_enrichment(
    pool: &PgPool,
    item_id: i64,
    summary: &str,
    opinion: &str,
    image_url: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE newsy.item
        SET summary = $2,
            opinion = $3,
            image_url = COALESCE(image_url, $4)
        WHERE item_id = $1 AND summary IS NULL
        "#,
    )
    .bind(item_id)
    .bind(summary)
    .bind(opinion)
    .bind(image_url)
    .execute(pool)
    .await?;
    Ok(())
}

/// Mark the delivered items sent and append the rotation-history row, in
/// one transaction. Runs only after delivery succeeded.
///
/// The update is guarded on `sent_at IS NULL`; if any item was already
/// marked by an overlapping run the whole transaction rolls back and the
/// mismatch is surfaced loudly — a rerun recomposes from store state and
/// cannot double-send what this run already recorded.
pub async fn record_digest(
    pool: &PgPool,
    topic: &str,
    item_ids: &[i64],
    sent_at: DateTime<Utc>,
) -> Result<()> {
    if item_ids.is_empty() {
        bail!("refusing to record an empty digest");
    }

    let mut tx = pool.begin().await?;

    let marked = sqlx::query(
        r#"
        UPDATE newsy.item
        SET sent_at = $2
        WHERE item_id = ANY($1) AND sent_at IS NULL
        "#,
    )
    .bind(item_ids)
    .bind(sent_at)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if marked != item_ids.len() as u64 {
        // Rollback happens on drop; nothing is half-committed.
        bail!(
            "digest record mismatch: {} of {} items could be marked sent (topic '{}')",
            marked,
            item_ids.len(),
            topic
        );
    }

    sqlx::query(
        r#"
        INSERT INTO newsy.digest_record (topic, sent_at)
        VALUES ($1, $2)
        "#,
    )
    .bind(topic)
    .bind(sent_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
