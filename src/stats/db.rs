use anyhow::Result;
use sqlx::{PgPool, Row};

use super::types::ItemCounts;

pub async fn item_counts(pool: &PgPool) -> Result<ItemCounts> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS total,
               COUNT(*) FILTER (WHERE sent_at IS NULL) AS unsent,
               COUNT(*) FILTER (WHERE topic IS NULL) AS unclassified,
               COUNT(*) FILTER (WHERE summary IS NULL) AS unsummarized
        FROM newsy.item
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(ItemCounts {
        total: row.get("total"),
        unsent: row.get("unsent"),
        unclassified: row.get("unclassified"),
        unsummarized: row.get("unsummarized"),
    })
}
