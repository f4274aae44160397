use anyhow::Result;
use clap::Args;
use reqwest::Client;
use sqlx::PgPool;

use crate::feeds::db as feeds_db;
use crate::telemetry::ops::fetch::Phase as FetchPhase;
use crate::telemetry::{self};

pub mod fetch;
pub mod parse;
pub mod types;
mod write;

use self::types::{FeedSample, FeedSummary, FetchApply, FetchPlan, FetchTotals};

#[derive(Args)]
pub struct FetchCmd {
    /// Restrict to a single feed id
    #[arg(long)]
    pub feed: Option<i32>,
    /// Max entries taken per feed
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
    #[arg(long, default_value_t = false)]
    pub apply: bool,
    #[arg(long, default_value_t = 10)]
    pub plan_limit: usize,
}

pub async fn run(pool: &PgPool, args: FetchCmd) -> Result<()> {
    let log = telemetry::fetch();
    let _g = log
        .root_span_kv([
            ("apply", args.apply.to_string()),
            ("limit", args.limit.to_string()),
            ("plan_limit", args.plan_limit.to_string()),
            ("feed", format!("{:?}", args.feed)),
        ])
        .entered();

    let feeds = feeds_db::select_feeds_for_fetch(pool, args.feed).await?;

    if !args.apply {
        let _s = log.span(&FetchPhase::Plan).entered();
        if telemetry::config::json_mode() {
            let samples: Vec<FeedSample> = feeds
                .iter()
                .take(args.plan_limit)
                .map(|f| FeedSample { feed_id: f.feed_id, url: f.url.clone(), name: f.name.clone() })
                .collect();
            let plan = FetchPlan { feeds: feeds.len(), limit: args.limit, sample_feeds: samples };
            log.plan(&plan)?;
        } else {
            log.info(format!("📝 Fetch plan — feeds={} limit={}", feeds.len(), args.limit));
            for f in feeds.iter().take(args.plan_limit) {
                log.info(format!("  feed_id={} url={} name={:?}", f.feed_id, f.url, f.name));
            }
            if feeds.len() > args.plan_limit {
                log.info(format!("  ... ({} more)", feeds.len() - args.plan_limit));
            }
            log.info("   Use --apply to execute.");
        }
        return Ok(());
    }

    let client = Client::new();

    let mut total_inserted = 0usize;
    let mut total_skipped = 0usize;
    let mut total_errors = 0usize;
    let mut per_feed: Vec<FeedSummary> = Vec::new();

    for f in feeds {
        let _feed_span = log
            .span_kv(&FetchPhase::Feed, [("feed_id", f.feed_id.to_string()), ("url", f.url.clone())])
            .entered();
        let source = f.name.clone().unwrap_or_else(|| f.url.clone());
        // Feeds named around AI are taken wholesale; general feeds go
        // through the keyword filter.
        let scoped_to_ai = source.to_lowercase().contains("ai");

        let mut inserted = 0usize;
        let mut skipped = 0usize;
        let mut errors = 0usize;

        // A broken feed must not sink the whole fetch run.
        let channel = {
            let xml = {
                let _s = log.span(&FetchPhase::FetchRss).entered();
                fetch::fetch_rss(&client, &f.url).await
            };
            match xml {
                Ok(xml) => {
                    let _s = log.span(&FetchPhase::ParseRss).entered();
                    parse::parse_channel(&xml)
                }
                Err(e) => Err(e),
            }
        };
        let channel = match channel {
            Ok(ch) => ch,
            Err(e) => {
                log.warn(format!("⚠️  Feed {} failed: {e:#}", f.feed_id));
                total_errors += 1;
                per_feed.push(FeedSummary { feed_id: f.feed_id, inserted: 0, skipped: 0, errors: 1 });
                continue;
            }
        };

        for entry in channel.items().iter().take(args.limit) {
            let Some(candidate) = parse::entry_to_candidate(&source, entry) else {
                skipped += 1;
                log.info_kv("↩️ skip", [("reason", "no-title-or-link".to_string())]);
                continue;
            };

            if !scoped_to_ai && !parse::is_ai_related(&candidate.title, candidate.content.as_deref()) {
                skipped += 1;
                log.info_kv("↩️ skip", [("reason", "off-topic".to_string()), ("title", candidate.title.clone())]);
                continue;
            }

            let _ws = log.span_kv(&FetchPhase::WriteItem, [("url", candidate.url.clone())]).entered();
            match write::insert_item(pool, &candidate).await {
                Ok(true) => {
                    inserted += 1;
                    log.info_kv("➕ insert", [("url", candidate.url.clone()), ("title", candidate.title.clone())]);
                }
                Ok(false) => {
                    skipped += 1;
                    log.info_kv("↩️ skip", [("reason", "duplicate-url".to_string()), ("title", candidate.title.clone())]);
                }
                Err(e) => {
                    errors += 1;
                    log.warn(format!("⚠️  insert failed for {}: {e:#}", candidate.url));
                }
            }
        }

        total_inserted += inserted;
        total_skipped += skipped;
        total_errors += errors;
        log.feed_summary(f.feed_id, inserted, skipped, errors);
        per_feed.push(FeedSummary { feed_id: f.feed_id, inserted, skipped, errors });
    }

    log.totals(total_inserted, total_skipped, total_errors);

    if telemetry::config::json_mode() {
        let result = FetchApply {
            totals: FetchTotals { inserted: total_inserted, skipped: total_skipped, errors: total_errors },
            per_feed,
        };
        log.result(&result)?;
    }
    Ok(())
}
