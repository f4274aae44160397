mod db;
pub mod types;

use anyhow::Result;
use clap::Args;
use sqlx::PgPool;

use crate::store::db as store_db;
use crate::subscribers::db as subscribers_db;
use crate::telemetry::ops::stats::Phase as StatsPhase;
use crate::telemetry::{self};

use self::types::StatsSummary;

#[derive(Args, Debug)]
pub struct StatsCmd {
    /// How many recent digest records to show
    #[arg(long, default_value_t = 10)]
    pub digests: i64,
}

pub async fn run(pool: &PgPool, args: StatsCmd) -> Result<()> {
    let log = telemetry::stats();
    let _g = log.root_span_kv([("digests", args.digests.to_string())]).entered();

    let _s = log.span(&StatsPhase::Collect).entered();
    let items = db::item_counts(pool).await?;
    let topics = store_db::list_topics_with_unsent_count(pool).await?;
    let recent_digests = store_db::list_digest_records(pool, None, args.digests).await?;
    let active_subscribers = subscribers_db::count_active_subscribers(pool).await?;
    drop(_s);

    log.info(format!(
        "📊 Items — total={} unsent={} unclassified={} unsummarized={}",
        items.total, items.unsent, items.unclassified, items.unsummarized
    ));
    log.info("🏷️  Unsent by topic:");
    for topic in &topics {
        log.info(format!(
            "  {} — unsent={} last_sent={}",
            topic.topic,
            topic.unsent,
            topic
                .last_sent_at
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_else(|| "never".to_string())
        ));
    }
    log.info(format!("🗞️  Recent digests ({}):", recent_digests.len()));
    for record in &recent_digests {
        log.info(format!("  [{}] {} at {}", record.digest_id, record.topic, record.sent_at.to_rfc3339()));
    }
    log.info(format!("👥 Active subscribers: {}", active_subscribers));

    if telemetry::config::json_mode() {
        let summary = StatsSummary {
            items,
            topics,
            recent_digests,
            active_subscribers,
        };
        log.result(&summary)?;
    }
    Ok(())
}
