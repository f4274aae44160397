// Core digest selection logic: topic rotation and pool building. Both
// functions are pure over their inputs (the clock is injected), so a rerun
// against the same store snapshot always reproduces the same digest.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::store::{Item, TopicInventory};

/// Knobs for one composition run. Always passed in explicitly; nothing in
/// this module reads the environment.
#[derive(Debug, Clone)]
pub struct ComposeConfig {
    pub cooldown_days: i64,
    pub max_per_source: usize,
    pub max_total: Option<usize>,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            cooldown_days: 5,
            max_per_source: 2,
            max_total: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotationChoice {
    pub topic: String,
    /// True when every candidate was still inside its cooldown window and
    /// the selector picked one anyway to keep the pipeline moving.
    pub fallback: bool,
}

/// Pick the topic for today's digest.
///
/// A topic is eligible when it never headlined a digest or its last digest
/// is older than the cooldown window. Among eligible topics: most unsent
/// items first, then oldest last-sent (never-sent counts as oldest), then
/// lexicographic label. When nothing is eligible the same ordering is
/// applied to all candidates so a send still happens; `None` only when
/// there are no unsent classified items at all.
pub fn choose_topic(
    inventories: &[TopicInventory],
    cfg: &ComposeConfig,
    now: DateTime<Utc>,
) -> Option<RotationChoice> {
    if inventories.is_empty() {
        return None;
    }

    let cutoff = now - Duration::days(cfg.cooldown_days);
    let eligible: Vec<&TopicInventory> = inventories
        .iter()
        .filter(|inv| inv.last_sent_at.map_or(true, |ts| ts < cutoff))
        .collect();

    if let Some(best) = pick_best(&eligible) {
        return Some(RotationChoice {
            topic: best.topic.clone(),
            fallback: false,
        });
    }

    let all: Vec<&TopicInventory> = inventories.iter().collect();
    pick_best(&all).map(|best| RotationChoice {
        topic: best.topic.clone(),
        fallback: true,
    })
}

// Deterministic triple: unsent desc, last_sent asc with None first, label asc.
fn pick_best<'a>(candidates: &[&'a TopicInventory]) -> Option<&'a TopicInventory> {
    candidates
        .iter()
        .copied()
        .min_by_key(|inv| (Reverse(inv.unsent), inv.last_sent_at, inv.topic.clone()))
}

/// Cap and interleave the topic's unsent items into the digest pool.
///
/// Items are grouped by source (newest first within each group, at most
/// `max_per_source` kept), then merged round-robin in first-appearance
/// order until the groups drain or `max_total` is hit. With two or more
/// sources in the capped set, adjacent output items never share a source.
pub fn build_pool(items: &[Item], cfg: &ComposeConfig) -> Vec<Item> {
    if cfg.max_per_source == 0 || cfg.max_total == Some(0) {
        return Vec::new();
    }

    // Newest first; the sort is stable so equal timestamps keep input order.
    let mut sorted: Vec<&Item> = items.iter().collect();
    sorted.sort_by(|a, b| b.fetched_at.cmp(&a.fetched_at));

    let mut source_order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, VecDeque<&Item>> = HashMap::new();
    for item in sorted {
        let queue = groups.entry(item.source.as_str()).or_insert_with(|| {
            source_order.push(item.source.as_str());
            VecDeque::new()
        });
        if queue.len() < cfg.max_per_source {
            queue.push_back(item);
        }
    }

    let cap = cfg.max_total.unwrap_or(usize::MAX);
    let mut pool: Vec<Item> = Vec::new();
    loop {
        let mut emitted = false;
        for source in &source_order {
            if pool.len() >= cap {
                return pool;
            }
            if let Some(item) = groups.get_mut(source).and_then(|q| q.pop_front()) {
                pool.push(item.clone());
                emitted = true;
            }
        }
        if !emitted {
            break;
        }
    }
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(t: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(t, 0).unwrap()
    }

    fn item(id: i64, source: &str, fetched_at: DateTime<Utc>) -> Item {
        Item {
            item_id: id,
            url: format!("https://example.com/{id}"),
            title: format!("Item {id}"),
            source: source.to_string(),
            content: None,
            summary: None,
            opinion: None,
            image_url: None,
            topic: Some("LLMs".to_string()),
            fetched_at,
            sent_at: None,
        }
    }

    fn inventory(topic: &str, unsent: i64, last_sent_at: Option<DateTime<Utc>>) -> TopicInventory {
        TopicInventory {
            topic: topic.to_string(),
            unsent,
            last_sent_at,
        }
    }

    fn cfg(cooldown_days: i64, max_per_source: usize, max_total: Option<usize>) -> ComposeConfig {
        ComposeConfig {
            cooldown_days,
            max_per_source,
            max_total,
        }
    }

    // --- rotation ---

    #[test]
    fn no_candidates_means_no_send() {
        let now = Utc::now();
        assert!(choose_topic(&[], &cfg(5, 2, None), now).is_none());
    }

    #[test]
    fn never_sent_topic_beats_topic_in_cooldown() {
        let now = Utc.with_ymd_and_hms(2025, 8, 5, 9, 0, 0).unwrap();
        let inventories = vec![
            inventory("Robotics", 7, Some(now - Duration::days(2))),
            inventory("LLMs", 3, None),
        ];
        let choice = choose_topic(&inventories, &cfg(5, 2, None), now).unwrap();
        assert_eq!(choice.topic, "LLMs");
        assert!(!choice.fallback);
    }

    #[test]
    fn cooldown_expiry_restores_eligibility() {
        let now = Utc.with_ymd_and_hms(2025, 8, 5, 9, 0, 0).unwrap();
        let inventories = vec![inventory("Robotics", 7, Some(now - Duration::days(6)))];
        let choice = choose_topic(&inventories, &cfg(5, 2, None), now).unwrap();
        assert_eq!(choice.topic, "Robotics");
        assert!(!choice.fallback);
    }

    #[test]
    fn most_unsent_wins_among_eligible() {
        let now = Utc::now();
        let inventories = vec![
            inventory("Safety", 2, None),
            inventory("Models", 9, None),
            inventory("Industry", 5, None),
        ];
        let choice = choose_topic(&inventories, &cfg(5, 2, None), now).unwrap();
        assert_eq!(choice.topic, "Models");
    }

    #[test]
    fn inventory_tie_breaks_on_oldest_last_sent_then_label() {
        let now = Utc.with_ymd_and_hms(2025, 8, 5, 9, 0, 0).unwrap();

        // Same count: the one sent longer ago wins.
        let inventories = vec![
            inventory("A", 4, Some(now - Duration::days(6))),
            inventory("B", 4, Some(now - Duration::days(9))),
        ];
        let choice = choose_topic(&inventories, &cfg(5, 2, None), now).unwrap();
        assert_eq!(choice.topic, "B");

        // Never-sent counts as oldest.
        let inventories = vec![
            inventory("A", 4, Some(now - Duration::days(9))),
            inventory("B", 4, None),
        ];
        let choice = choose_topic(&inventories, &cfg(5, 2, None), now).unwrap();
        assert_eq!(choice.topic, "B");

        // Full tie: lexicographic label.
        let inventories = vec![inventory("B", 4, None), inventory("A", 4, None)];
        let choice = choose_topic(&inventories, &cfg(5, 2, None), now).unwrap();
        assert_eq!(choice.topic, "A");
    }

    #[test]
    fn all_in_cooldown_falls_back_to_largest_inventory() {
        let now = Utc.with_ymd_and_hms(2025, 8, 5, 9, 0, 0).unwrap();
        let inventories = vec![
            inventory("Safety", 2, Some(now - Duration::days(1))),
            inventory("Models", 9, Some(now - Duration::days(2))),
            inventory("Industry", 5, Some(now - Duration::days(3))),
        ];
        let choice = choose_topic(&inventories, &cfg(5, 2, None), now).unwrap();
        assert_eq!(choice.topic, "Models");
        assert!(choice.fallback);
    }

    #[test]
    fn rotation_is_deterministic_over_identical_input() {
        let now = Utc.with_ymd_and_hms(2025, 8, 5, 9, 0, 0).unwrap();
        let inventories = vec![
            inventory("A", 4, Some(now - Duration::days(1))),
            inventory("B", 4, Some(now - Duration::days(1))),
        ];
        let config = cfg(5, 2, None);
        let first = choose_topic(&inventories, &config, now).unwrap();
        let second = choose_topic(&inventories, &config, now).unwrap();
        assert_eq!(first, second);
    }

    // --- pool building ---

    #[test]
    fn caps_per_source_and_interleaves_round_robin() {
        // 3 from A (t=5,4,3), 2 from B (t=2,1), cap 2:
        // pool = A(5), B(2), A(4); A(3) dropped by the cap.
        let items = vec![
            item(1, "A", at(5)),
            item(2, "A", at(4)),
            item(3, "A", at(3)),
            item(4, "B", at(2)),
            item(5, "B", at(1)),
        ];
        let pool = build_pool(&items, &cfg(5, 2, None));
        let ids: Vec<i64> = pool.iter().map(|i| i.item_id).collect();
        assert_eq!(ids, vec![1, 4, 2]);
    }

    #[test]
    fn adjacent_items_never_share_a_source_with_two_sources_present() {
        let items = vec![
            item(1, "A", at(9)),
            item(2, "A", at(8)),
            item(3, "B", at(7)),
            item(4, "B", at(6)),
            item(5, "C", at(5)),
        ];
        let pool = build_pool(&items, &cfg(5, 2, None));
        for pair in pool.windows(2) {
            assert_ne!(pair[0].source, pair[1].source);
        }
    }

    #[test]
    fn per_source_cap_holds_for_every_source() {
        let items: Vec<Item> = (0..12)
            .map(|i| item(i, if i % 2 == 0 { "A" } else { "B" }, at(100 - i)))
            .collect();
        let pool = build_pool(&items, &cfg(5, 2, None));
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for item in &pool {
            *counts.entry(item.source.as_str()).or_default() += 1;
        }
        assert!(counts.values().all(|&n| n <= 2));
    }

    #[test]
    fn single_source_degrades_to_reverse_chronological() {
        let items = vec![
            item(1, "A", at(1)),
            item(2, "A", at(3)),
            item(3, "A", at(2)),
        ];
        let pool = build_pool(&items, &cfg(5, 5, None));
        let ids: Vec<i64> = pool.iter().map(|i| i.item_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn max_total_truncates_the_round_robin() {
        let items = vec![
            item(1, "A", at(9)),
            item(2, "A", at(8)),
            item(3, "B", at(7)),
            item(4, "B", at(6)),
        ];
        let pool = build_pool(&items, &cfg(5, 2, Some(3)));
        let ids: Vec<i64> = pool.iter().map(|i| i.item_id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn empty_input_yields_empty_pool() {
        assert!(build_pool(&[], &cfg(5, 2, None)).is_empty());
    }

    #[test]
    fn pool_is_deterministic_over_identical_input() {
        let items = vec![
            item(1, "A", at(5)),
            item(2, "B", at(5)),
            item(3, "C", at(4)),
        ];
        let config = cfg(5, 2, None);
        let first: Vec<i64> = build_pool(&items, &config).iter().map(|i| i.item_id).collect();
        let second: Vec<i64> = build_pool(&items, &config).iter().map(|i| i.item_id).collect();
        assert_eq!(first, second);
    }
}
