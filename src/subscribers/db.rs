use anyhow::Result;
use sqlx::{PgPool, Row};

use crate::store::{Subscriber, db::subscriber_from_row};

/// Insert a new (unconfirmed) subscriber. Returns None when the email is
/// already registered.
pub async fn insert_subscriber(
    pool: &PgPool,
    email: &str,
    confirm_token: &str,
) -> Result<Option<Subscriber>> {
    let row = sqlx::query(
        r#"
        INSERT INTO newsy.subscriber (email, confirm_token, confirmed)
        VALUES ($1, $2, FALSE)
        ON CONFLICT (email) DO NOTHING
        RETURNING subscriber_id, email, confirm_token, confirmed, subscribed_at, unsubscribed_at
        "#,
    )
    .bind(email)
    .bind(confirm_token)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(subscriber_from_row))
}

/// Flip an unconfirmed subscriber to confirmed. Returns false when the
/// token is unknown or already confirmed.
pub async fn confirm_subscriber(pool: &PgPool, token: &str) -> Result<bool> {
    let exec = sqlx::query(
        r#"
        UPDATE newsy.subscriber
        SET confirmed = TRUE
        WHERE confirm_token = $1 AND confirmed = FALSE
        "#,
    )
    .bind(token)
    .execute(pool)
    .await?;
    Ok(exec.rows_affected() == 1)
}

/// Opt-out: stamp unsubscribed_at, keep the row for auditability.
pub async fn unsubscribe(pool: &PgPool, token: &str) -> Result<bool> {
    let exec = sqlx::query(
        r#"
        UPDATE newsy.subscriber
        SET unsubscribed_at = now()
        WHERE confirm_token = $1 AND unsubscribed_at IS NULL
        "#,
    )
    .bind(token)
    .execute(pool)
    .await?;
    Ok(exec.rows_affected() == 1)
}

pub async fn list_subscribers(pool: &PgPool, include_inactive: bool) -> Result<Vec<Subscriber>> {
    let rows = sqlx::query(
        r#"
        SELECT subscriber_id, email, confirm_token, confirmed, subscribed_at, unsubscribed_at
        FROM newsy.subscriber
        WHERE $1::bool OR (confirmed = TRUE AND unsubscribed_at IS NULL)
        ORDER BY subscriber_id
        "#,
    )
    .bind(include_inactive)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(subscriber_from_row).collect())
}

pub async fn count_active_subscribers(pool: &PgPool) -> Result<i64> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS n
        FROM newsy.subscriber
        WHERE confirmed = TRUE AND unsubscribed_at IS NULL
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(row.get("n"))
}
