use serde::Serialize;

use crate::store::{DigestRecord, TopicInventory};

#[derive(Serialize)]
pub struct ItemCounts {
    pub total: i64,
    pub unsent: i64,
    pub unclassified: i64,
    pub unsummarized: i64,
}

#[derive(Serialize)]
pub struct StatsSummary {
    pub items: ItemCounts,
    pub topics: Vec<TopicInventory>,
    pub recent_digests: Vec<DigestRecord>,
    pub active_subscribers: i64,
}
