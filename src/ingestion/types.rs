use serde::Serialize;

/// A candidate row for the item table; `url` is the dedup key.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub url: String,
    pub title: String,
    pub source: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Serialize)]
pub struct FeedSample {
    pub feed_id: i32,
    pub url: String,
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct FetchPlan {
    pub feeds: usize,
    pub limit: usize,
    pub sample_feeds: Vec<FeedSample>,
}

#[derive(Serialize)]
pub struct FeedSummary {
    pub feed_id: i32,
    pub inserted: usize,
    pub skipped: usize,
    pub errors: usize,
}

#[derive(Serialize)]
pub struct FetchTotals {
    pub inserted: usize,
    pub skipped: usize,
    pub errors: usize,
}

#[derive(Serialize)]
pub struct FetchApply {
    pub totals: FetchTotals,
    pub per_feed: Vec<FeedSummary>,
}
