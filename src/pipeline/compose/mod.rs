pub mod logic;
pub mod select;
mod db;
mod enrich;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use sqlx::PgPool;

use crate::delivery::DeliveryClient;
use crate::delivery::render;
use crate::delivery::sendgrid::{SendGridClient, SendGridConfig};
use crate::enrich::Enricher;
use crate::llm::openai::{OpenAiClient, OpenAiClientConfig};
use crate::store::Subscriber;
use crate::store::db as store_db;
use crate::telemetry::ctx::LogCtx;
use crate::telemetry::ops::compose::{Compose, Phase as ComposePhase};
use crate::telemetry::{self};

use self::logic::{ComposeConfig, build_pool, choose_topic};

const DEFAULT_APP_URL: &str = "https://newsy.example.com";

#[derive(Args, Debug)]
pub struct ComposeCmd {
    /// Days a topic stays ineligible after headlining a digest
    #[arg(long, default_value_t = 5)]
    pub cooldown_days: i64,
    /// Max items any single source contributes to one digest
    #[arg(long, default_value_t = 2)]
    pub max_per_source: usize,
    /// Hard cap on digest size (unbounded when omitted)
    #[arg(long)]
    pub max_total: Option<usize>,
    #[arg(long, default_value_t = false)]
    pub apply: bool,
    #[arg(long, default_value_t = 10)]
    pub plan_limit: usize,
}

#[derive(Serialize)]
struct PoolPreview {
    rank: usize,
    item_id: i64,
    source: String,
    title: String,
    enriched: bool,
}

#[derive(Serialize)]
struct ComposePlan {
    topic: String,
    fallback: bool,
    pool_size: usize,
    needs_enrichment: usize,
    sample_items: Vec<PoolPreview>,
}

#[derive(Serialize)]
struct ComposeResult {
    topic: String,
    fallback: bool,
    pool_size: usize,
    enriched: usize,
    excluded: usize,
    delivered: usize,
    failed_deliveries: usize,
    recorded: bool,
}

#[derive(Serialize)]
struct ComposeNoop {
    reason: &'static str,
}

pub async fn run(pool: &PgPool, args: ComposeCmd) -> Result<()> {
    let log = telemetry::compose();
    let _g = log
        .root_span_kv([
            ("cooldown_days", args.cooldown_days.to_string()),
            ("max_per_source", args.max_per_source.to_string()),
            ("max_total", format!("{:?}", args.max_total)),
            ("apply", args.apply.to_string()),
            ("plan_limit", args.plan_limit.to_string()),
        ])
        .entered();

    let cfg = ComposeConfig {
        cooldown_days: args.cooldown_days,
        max_per_source: args.max_per_source,
        max_total: args.max_total,
    };
    let now = Utc::now();

    // Rotation: which topic headlines today.
    let _s = log.span(&ComposePhase::SelectTopic).entered();
    let inventories = select::topic_inventories(pool).await?;
    log.debug(format!("{} candidate topic(s) with unsent inventory", inventories.len()));
    let Some(choice) = choose_topic(&inventories, &cfg, now) else {
        log.info("ℹ️  No unsent classified items — nothing to send today");
        if telemetry::config::json_mode() {
            log.result(&ComposeNoop { reason: "no-unsent-items" })?;
        }
        return Ok(());
    };
    drop(_s);

    if choice.fallback {
        log.rotation_fallback(&choice.topic);
    }
    log.info(format!("🗞️  Topic for today: {}", choice.topic));

    // Pool: cap + interleave the topic's unsent items.
    let _s = log.span(&ComposePhase::BuildPool).entered();
    let candidates = select::pool_candidates(pool, &choice.topic).await?;
    let pool_items = build_pool(&candidates, &cfg);
    drop(_s);

    if pool_items.is_empty() {
        log.info(format!("ℹ️  Empty pool for topic '{}' — nothing to send", choice.topic));
        if telemetry::config::json_mode() {
            log.result(&ComposeNoop { reason: "empty-pool" })?;
        }
        return Ok(());
    }

    let needs_enrichment = pool_items.iter().filter(|i| !i.is_enriched()).count();

    if !args.apply {
        let _s = log.span(&ComposePhase::Plan).entered();
        log.info(format!(
            "📝 Compose plan — topic={} fallback={} pool={} needs_enrichment={}",
            choice.topic,
            choice.fallback,
            pool_items.len(),
            needs_enrichment
        ));
        for (rank, item) in pool_items.iter().take(args.plan_limit).enumerate() {
            log.info(format!("  {}. [{}] {} — {}", rank + 1, item.source, item.title, item.url));
        }
        if pool_items.len() > args.plan_limit {
            log.info(format!("  ... ({} more)", pool_items.len() - args.plan_limit));
        }
        log.info("   Use --apply to enrich, deliver and record.");
        if telemetry::config::json_mode() {
            let sample_items = pool_items
                .iter()
                .take(args.plan_limit)
                .enumerate()
                .map(|(rank, item)| PoolPreview {
                    rank: rank + 1,
                    item_id: item.item_id,
                    source: item.source.clone(),
                    title: item.title.clone(),
                    enriched: item.is_enriched(),
                })
                .collect();
            let plan = ComposePlan {
                topic: choice.topic.clone(),
                fallback: choice.fallback,
                pool_size: pool_items.len(),
                needs_enrichment,
                sample_items,
            };
            log.plan(&plan)?;
        }
        return Ok(());
    }

    // Just-in-time enrichment for the selected subset only.
    let _s = log.span(&ComposePhase::Enrich).entered();
    let llm = OpenAiClient::new(OpenAiClientConfig::from_env())
        .map_err(anyhow::Error::new)
        .context("init LLM client")?;
    let enricher = Enricher::new(&llm);
    let outcome = enrich::ensure_enriched(pool, &enricher, &log, pool_items).await?;
    drop(_s);

    log.info(format!(
        "✨ Enrichment — reused={} new={} excluded={}",
        outcome.items.len() - outcome.enriched,
        outcome.enriched,
        outcome.excluded
    ));

    if outcome.items.is_empty() {
        log.warn("⚠️  Every pool item failed enrichment — skipping today's send");
        if telemetry::config::json_mode() {
            log.result(&ComposeNoop { reason: "all-enrichment-failed" })?;
        }
        return Ok(());
    }

    let subscribers = store_db::list_active_subscribers(pool).await?;
    if subscribers.is_empty() {
        log.info("ℹ️  No active subscribers — leaving the pool unsent");
        if telemetry::config::json_mode() {
            log.result(&ComposeNoop { reason: "no-subscribers" })?;
        }
        return Ok(());
    }

    // Render once per subscriber: the unsubscribe link is personal.
    let _s = log.span(&ComposePhase::Render).entered();
    let app_url = std::env::var("NEWSY_APP_URL").unwrap_or_else(|_| DEFAULT_APP_URL.to_string());
    let subject = render::subject_line(&choice.topic, outcome.items.len(), now);
    drop(_s);

    let _s = log.span(&ComposePhase::Deliver).entered();
    let delivery = SendGridClient::new(SendGridConfig::from_env())
        .map_err(anyhow::Error::new)
        .context("init delivery client")?;

    let (delivered, failed) = deliver_to_subscribers(&delivery, &log, &subscribers, &subject, |sub| {
        render::render_digest(&choice.topic, &outcome.items, now, &app_url, &sub.confirm_token)
    })
    .await;
    drop(_s);

    log.delivery_summary(delivered, failed);

    // The recorder must not run when nothing went out; the pool stays
    // unsent and the next invocation retries it.
    if delivered == 0 {
        bail!(
            "delivery failed for all {} subscribers — digest not recorded",
            subscribers.len()
        );
    }

    let _s = log.span(&ComposePhase::Record).entered();
    let item_ids: Vec<i64> = outcome.items.iter().map(|i| i.item_id).collect();
    if let Err(err) = db::record_digest(pool, &choice.topic, &item_ids, now).await {
        // The one state where a message went out without being recorded.
        log.error(format!("🚨 Digest delivered but not recorded: {err:#}"));
        return Err(err.context("record digest after successful delivery"));
    }
    drop(_s);

    log.info(format!(
        "📌 Recorded digest — topic={} items={} sent_at={}",
        choice.topic,
        item_ids.len(),
        now.to_rfc3339()
    ));

    if telemetry::config::json_mode() {
        let result = ComposeResult {
            topic: choice.topic,
            fallback: choice.fallback,
            pool_size: outcome.items.len() + outcome.excluded,
            enriched: outcome.enriched,
            excluded: outcome.excluded,
            delivered,
            failed_deliveries: failed,
            recorded: true,
        };
        log.result(&result)?;
    }
    Ok(())
}

/// Send one personalized rendering to every subscriber. Per-recipient
/// failures are logged and counted, never fatal; the caller decides what a
/// fully failed send means.
async fn deliver_to_subscribers(
    client: &dyn DeliveryClient,
    log: &LogCtx<Compose>,
    subscribers: &[Subscriber],
    subject: &str,
    render_for: impl Fn(&Subscriber) -> String,
) -> (usize, usize) {
    let mut delivered = 0usize;
    let mut failed = 0usize;
    for subscriber in subscribers {
        let html = render_for(subscriber);
        match client.deliver(&subscriber.email, subject, &html).await {
            Ok(()) => delivered += 1,
            Err(err) => {
                failed += 1;
                let hint = if err.is_retryable() { "transient" } else { "permanent" };
                log.warn(format!(
                    "⚠️  Delivery to {} failed ({hint}): {}",
                    subscriber.email, err
                ));
            }
        }
    }
    (delivered, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::{DeliveryError, MockDelivery};
    use reqwest::StatusCode;

    fn subscriber(id: i64, email: &str, token: &str) -> Subscriber {
        Subscriber {
            subscriber_id: id,
            email: email.to_string(),
            confirm_token: token.to_string(),
            confirmed: true,
            subscribed_at: Utc::now(),
            unsubscribed_at: None,
        }
    }

    #[tokio::test]
    async fn each_subscriber_gets_a_personalized_rendering() {
        let mock = MockDelivery::new();
        mock.push_outcome(Ok(()));
        mock.push_outcome(Ok(()));
        let log = telemetry::compose();
        let subscribers = vec![
            subscriber(1, "a@example.com", "tok-a"),
            subscriber(2, "b@example.com", "tok-b"),
        ];

        let (delivered, failed) =
            deliver_to_subscribers(&mock, &log, &subscribers, "Digest", |sub| {
                format!("<a href=\"/unsubscribe?token={}\">bye</a>", sub.confirm_token)
            })
            .await;

        assert_eq!((delivered, failed), (2, 0));
        let sends = mock.sends();
        assert_eq!(sends[0].to, "a@example.com");
        assert!(sends[0].html.contains("tok-a"));
        assert!(sends[1].html.contains("tok-b"));
        assert_eq!(sends[0].subject, "Digest");
    }

    #[tokio::test]
    async fn one_failed_recipient_does_not_stop_the_rest() {
        let mock = MockDelivery::new();
        mock.push_outcome(Err(DeliveryError::Api {
            status: StatusCode::BAD_GATEWAY,
            body: "upstream".to_string(),
        }));
        mock.push_outcome(Ok(()));
        let log = telemetry::compose();
        let subscribers = vec![
            subscriber(1, "a@example.com", "tok-a"),
            subscriber(2, "b@example.com", "tok-b"),
        ];

        let (delivered, failed) =
            deliver_to_subscribers(&mock, &log, &subscribers, "Digest", |_| String::new()).await;

        assert_eq!((delivered, failed), (1, 1));
        assert_eq!(mock.sends().len(), 2);
    }
}
