use anyhow::Result;
use sqlx::PgPool;

use super::types::NewItem;

/// Insert-if-new keyed on URL. Returns false when the item already exists.
pub async fn insert_item(pool: &PgPool, item: &NewItem) -> Result<bool> {
    let exec = sqlx::query(
        r#"
        INSERT INTO newsy.item (url, title, source, content, image_url, fetched_at)
        VALUES ($1, $2, $3, $4, $5, now())
        ON CONFLICT (url) DO NOTHING
        "#,
    )
    .bind(&item.url)
    .bind(&item.title)
    .bind(&item.source)
    .bind(&item.content)
    .bind(&item.image_url)
    .execute(pool)
    .await?;
    Ok(exec.rows_affected() == 1)
}
