use anyhow::Result;
use sqlx::PgPool;

use crate::store::{Item, TopicInventory, db};

// Read-only snapshot the rotation selector works from. Delegates to the
// store adapter so the query surface stays in one place.
pub async fn topic_inventories(pool: &PgPool) -> Result<Vec<TopicInventory>> {
    db::list_topics_with_unsent_count(pool).await
}

// Unsent, classified items for the chosen topic, newest first. The pool
// builder caps and interleaves this sequence without further I/O.
pub async fn pool_candidates(pool: &PgPool, topic: &str) -> Result<Vec<Item>> {
    db::list_unsent_items(pool, Some(topic)).await
}
