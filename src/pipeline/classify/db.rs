use anyhow::Result;
use sqlx::PgPool;

// Sole writer of `topic`. The NULL guard makes the label write-once: a
// concurrent run that got there first wins and this write is a no-op.
pub async fn write_topic(pool: &PgPool, item_id: i64, topic: &str) -> Result<bool> {
    let exec = sqlx::query(
        r#"
        UPDATE newsy.item
        SET topic = $2
        WHERE item_id = $1 AND topic IS NULL
        "#,
    )
    .bind(item_id)
    .bind(topic)
    .execute(pool)
    .await?;
    Ok(exec.rows_affected() == 1)
}
