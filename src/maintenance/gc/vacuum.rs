use anyhow::Result;
use sqlx::PgPool;

pub async fn analyze_tables(pool: &PgPool) -> Result<()> {
    sqlx::query("ANALYZE newsy.item").execute(pool).await?;
    sqlx::query("ANALYZE newsy.digest_record").execute(pool).await?;
    Ok(())
}
