use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::enrich::Enricher;
use crate::store::Item;
use crate::telemetry::ctx::LogCtx;
use crate::telemetry::ops::compose::Compose;

use super::db;

#[derive(Debug)]
pub struct EnrichOutcome {
    /// Pool items ready for delivery, original order preserved.
    pub items: Vec<Item>,
    /// How many collaborator calls actually happened.
    pub enriched: usize,
    /// Items dropped from this digest after a failed enrichment; they stay
    /// unsent and unenriched for a later run.
    pub excluded: usize,
}

/// Fill in summary/opinion/image for the selected pool, just in time.
///
/// Already-enriched items pass through without a collaborator call, which
/// makes a rerun over the same pool free. Results are persisted per item
/// as they arrive, so a crash mid-loop keeps the completed work. A failed
/// item is logged and excluded; the rest of the digest still goes out.
/// Only store errors abort the run.
pub async fn ensure_enriched(
    pool: &PgPool,
    enricher: &Enricher<'_>,
    log: &LogCtx<Compose>,
    items: Vec<Item>,
) -> Result<EnrichOutcome> {
    let mut out: Vec<Item> = Vec::with_capacity(items.len());
    let mut enriched = 0usize;
    let mut excluded = 0usize;

    for mut item in items {
        if item.is_enriched() {
            out.push(item);
            continue;
        }

        match enricher.summarize(&item.title, item.content.as_deref()).await {
            Ok(enrichment) => {
                let new_image = if item.image_url.is_none() {
                    enrichment.image_url.as_deref()
                } else {
                    None
                };
                db::write_enrichment(
                    pool,
                    item.item_id,
                    &enrichment.summary,
                    &enrichment.opinion,
                    new_image,
                )
                .await
                .with_context(|| format!("persist enrichment for item {}", item.item_id))?;

                item.summary = Some(enrichment.summary);
                item.opinion = Some(enrichment.opinion);
                if item.image_url.is_none() {
                    item.image_url = enrichment.image_url;
                }
                enriched += 1;
                out.push(item);
            }
            Err(err) => {
                excluded += 1;
                let hint = if err.is_retryable() { "transient" } else { "permanent" };
                log.warn(format!(
                    "⚠️  Enrichment failed for item {} ({hint}, {}): {} — excluded from this digest",
                    item.item_id, item.url, err
                ));
            }
        }
    }

    Ok(EnrichOutcome {
        items: out,
        enriched,
        excluded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::openai::{MockClient, OpenAiError};
    use crate::telemetry;
    use chrono::Utc;

    // Lazy pool: no connection is made unless a query actually runs, and
    // these tests only exercise paths that never hit the store.
    fn offline_pool() -> PgPool {
        PgPool::connect_lazy("postgres://localhost/unused").unwrap()
    }

    fn item(id: i64, summary: Option<&str>) -> Item {
        Item {
            item_id: id,
            url: format!("https://example.com/{id}"),
            title: format!("Item {id}"),
            source: "A".to_string(),
            content: Some("body".to_string()),
            summary: summary.map(String::from),
            opinion: summary.map(|_| "Take.".to_string()),
            image_url: None,
            topic: Some("Models".to_string()),
            fetched_at: Utc::now(),
            sent_at: None,
        }
    }

    #[tokio::test]
    async fn already_enriched_items_trigger_no_collaborator_calls() {
        let mock = MockClient::new();
        let enricher = Enricher::new(&mock);
        let log = telemetry::compose();

        let items = vec![item(1, Some("Done.")), item(2, Some("Also done."))];
        let outcome = ensure_enriched(&offline_pool(), &enricher, &log, items.clone())
            .await
            .unwrap();

        assert_eq!(mock.calls().len(), 0);
        assert_eq!(outcome.enriched, 0);
        assert_eq!(outcome.excluded, 0);
        assert_eq!(outcome.items.len(), 2);
        assert_eq!(outcome.items[0].summary.as_deref(), Some("Done."));
    }

    #[tokio::test]
    async fn failed_item_is_excluded_but_the_rest_survive() {
        let mock = MockClient::new();
        mock.push_response(Err(OpenAiError::Timeout));
        let enricher = Enricher::new(&mock);
        let log = telemetry::compose();

        let items = vec![item(1, None), item(2, Some("Done."))];
        let outcome = ensure_enriched(&offline_pool(), &enricher, &log, items)
            .await
            .unwrap();

        assert_eq!(outcome.excluded, 1);
        assert_eq!(outcome.enriched, 0);
        let ids: Vec<i64> = outcome.items.iter().map(|i| i.item_id).collect();
        assert_eq!(ids, vec![2]);
    }
}
