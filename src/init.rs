use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::telemetry::ops::init::Phase as InitPhase;
use crate::telemetry::{self};

// Apply any pending migrations (idempotent)
pub async fn run(pool: &PgPool) -> Result<()> {
    let log = telemetry::init();
    let _g = log.root_span().entered();

    let _s = log.span(&InitPhase::Migrate).entered();
    sqlx::migrate!()
        .run(pool)
        .await
        .context("apply database migrations")?;
    drop(_s);

    log.info("✅ Database initialized");
    Ok(())
}
