mod db;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use sqlx::PgPool;

use crate::enrich::Enricher;
use crate::llm::openai::{OpenAiClient, OpenAiClientConfig};
use crate::store::db as store_db;
use crate::telemetry::ops::classify::Phase as ClassifyPhase;
use crate::telemetry::{self};

/// Assign a topic to newly ingested items. Runs independently of digest
/// timing; items left unclassified stay invisible to composition and are
/// picked up on the next pass.
#[derive(Args, Debug)]
pub struct ClassifyCmd {
    /// Max items to classify this run
    #[arg(long)]
    pub max: Option<i64>,
    #[arg(long, default_value_t = false)]
    pub apply: bool,
    #[arg(long, default_value_t = 10)]
    pub plan_limit: usize,
}

#[derive(Serialize)]
struct ItemSample {
    item_id: i64,
    title: String,
    source: String,
}

#[derive(Serialize)]
struct ClassifyPlan {
    backlog: usize,
    planned: usize,
    sample_items: Vec<ItemSample>,
}

#[derive(Serialize)]
struct ClassifyResult {
    classified: usize,
    skipped: usize,
    failed: usize,
}

pub async fn run(pool: &PgPool, args: ClassifyCmd) -> Result<()> {
    let log = telemetry::classify();
    let _g = log
        .root_span_kv([
            ("max", format!("{:?}", args.max)),
            ("apply", args.apply.to_string()),
            ("plan_limit", args.plan_limit.to_string()),
        ])
        .entered();

    let _s = log.span(&ClassifyPhase::SelectItems).entered();
    let items = store_db::list_unclassified_items(pool, args.max).await?;
    drop(_s);

    if items.is_empty() {
        log.info("ℹ️  No unclassified items");
        return Ok(());
    }

    if !args.apply {
        let _s = log.span(&ClassifyPhase::Plan).entered();
        log.info(format!("📝 Classify plan — items={}", items.len()));
        for item in items.iter().take(args.plan_limit) {
            log.info(format!("  item_id={} [{}] {}", item.item_id, item.source, item.title));
        }
        if items.len() > args.plan_limit {
            log.info(format!("  ... ({} more)", items.len() - args.plan_limit));
        }
        log.info("   Use --apply to classify.");
        if telemetry::config::json_mode() {
            let sample_items = items
                .iter()
                .take(args.plan_limit)
                .map(|i| ItemSample {
                    item_id: i.item_id,
                    title: i.title.clone(),
                    source: i.source.clone(),
                })
                .collect();
            let plan = ClassifyPlan {
                backlog: items.len(),
                planned: items.len(),
                sample_items,
            };
            log.plan(&plan)?;
        }
        return Ok(());
    }

    let llm = OpenAiClient::new(OpenAiClientConfig::from_env())
        .map_err(anyhow::Error::new)
        .context("init LLM client")?;
    let enricher = Enricher::new(&llm);

    let mut classified = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for item in &items {
        let topic = {
            let _s = log.span(&ClassifyPhase::CallLlm).entered();
            enricher.classify(&item.title, item.content.as_deref()).await
        };
        let topic = match topic {
            Ok(topic) => topic,
            Err(err) => {
                // Deferred, not lost: the item stays unclassified and gets
                // retried on a later pass.
                failed += 1;
                log.warn(format!(
                    "⚠️  Classification failed for item {} ({}): {}",
                    item.item_id, item.url, err
                ));
                continue;
            }
        };

        let _s = log.span(&ClassifyPhase::WriteTopic).entered();
        let wrote = db::write_topic(pool, item.item_id, &topic)
            .await
            .with_context(|| format!("write topic for item {}", item.item_id))?;
        if wrote {
            classified += 1;
            log.info(format!("🏷️  item_id={} → {}", item.item_id, topic));
        } else {
            skipped += 1;
            log.info(format!("↩️ item_id={} already classified", item.item_id));
        }
    }

    log.info(format!(
        "📊 Classify totals — classified={} skipped={} failed={}",
        classified, skipped, failed
    ));

    if telemetry::config::json_mode() {
        log.result(&ClassifyResult { classified, skipped, failed })?;
    }
    Ok(())
}
