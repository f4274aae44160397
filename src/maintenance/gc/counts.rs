use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

pub async fn count_old_items(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<i64> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS n
        FROM newsy.item
        WHERE fetched_at < $1
        "#,
    )
    .bind(cutoff)
    .fetch_one(pool)
    .await?;
    Ok(row.get("n"))
}

pub async fn count_old_digest_records(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<i64> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS n
        FROM newsy.digest_record
        WHERE sent_at < $1
        "#,
    )
    .bind(cutoff)
    .fetch_one(pool)
    .await?;
    Ok(row.get("n"))
}
