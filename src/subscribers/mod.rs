use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::telemetry::ops::subscriber::Phase as SubPhase;
use crate::telemetry::{self};

pub mod db;

/// newsy subscriber add/confirm/remove/ls
#[derive(Args)]
pub struct SubscriberCmd {
    #[command(subcommand)]
    pub cmd: SubscriberSub,
}

#[derive(Subcommand)]
pub enum SubscriberSub {
    // opt a reader in (unconfirmed until they use the token)
    Add {
        email: String,
        #[arg(long, default_value_t = false)]
        apply: bool,
    },
    // confirm an opt-in by token
    Confirm {
        token: String,
        #[arg(long, default_value_t = false)]
        apply: bool,
    },
    // opt out by token
    Remove {
        token: String,
        #[arg(long, default_value_t = false)]
        apply: bool,
    },
    // list subscribers (active only unless --all)
    Ls {
        #[arg(long, default_value_t = false)]
        all: bool,
    },
}

pub async fn run(pool: &PgPool, args: SubscriberCmd) -> Result<()> {
    let log = telemetry::subscriber();
    let _g = log.root_span().entered();
    match args.cmd {
        SubscriberSub::Add { email, apply } => add(pool, email, apply).await?,
        SubscriberSub::Confirm { token, apply } => confirm(pool, token, apply).await?,
        SubscriberSub::Remove { token, apply } => remove(pool, token, apply).await?,
        SubscriberSub::Ls { all } => ls(pool, all).await?,
    }
    Ok(())
}

#[derive(Serialize)]
struct SubscriberAddResult {
    inserted: bool,
    email: String,
    confirm_token: Option<String>,
}

async fn add(pool: &PgPool, email: String, apply: bool) -> Result<()> {
    let log = telemetry::subscriber();
    let email = email.trim().to_lowercase();
    let _g = log
        .root_span_kv([
            ("mode", if apply { "apply".to_string() } else { "plan".to_string() }),
            ("email", email.clone()),
        ])
        .entered();

    if !apply {
        let _s = log.span(&SubPhase::Plan).entered();
        log.info(format!("📝 Subscriber plan — add email={}", email));
        log.info("   Use --apply to execute.");
        return Ok(());
    }

    let _s = log.span(&SubPhase::Add).entered();
    let token = Uuid::new_v4().to_string();
    let inserted = db::insert_subscriber(pool, &email, &token).await?;
    match &inserted {
        Some(sub) => log.info(format!("➕ Subscribed {} (confirm token {})", sub.email, sub.confirm_token)),
        None => log.info("↩️ Email already subscribed"),
    }
    if telemetry::config::json_mode() {
        let result = SubscriberAddResult {
            inserted: inserted.is_some(),
            email,
            confirm_token: inserted.map(|s| s.confirm_token),
        };
        log.result(&result)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct SubscriberTokenResult {
    updated: bool,
}

async fn confirm(pool: &PgPool, token: String, apply: bool) -> Result<()> {
    let log = telemetry::subscriber();
    let _g = log
        .root_span_kv([("mode", if apply { "apply".to_string() } else { "plan".to_string() })])
        .entered();

    if !apply {
        let _s = log.span(&SubPhase::Plan).entered();
        log.info("📝 Subscriber plan — confirm by token. Use --apply to execute.");
        return Ok(());
    }

    let _s = log.span(&SubPhase::Confirm).entered();
    let updated = db::confirm_subscriber(pool, &token).await?;
    if updated { log.info("✅ Subscriber confirmed"); }
    else { log.warn("⚠️  Token not found or already confirmed"); }
    if telemetry::config::json_mode() {
        log.result(&SubscriberTokenResult { updated })?;
    }
    Ok(())
}

async fn remove(pool: &PgPool, token: String, apply: bool) -> Result<()> {
    let log = telemetry::subscriber();
    let _g = log
        .root_span_kv([("mode", if apply { "apply".to_string() } else { "plan".to_string() })])
        .entered();

    if !apply {
        let _s = log.span(&SubPhase::Plan).entered();
        log.info("📝 Subscriber plan — unsubscribe by token. Use --apply to execute.");
        return Ok(());
    }

    let _s = log.span(&SubPhase::Remove).entered();
    let updated = db::unsubscribe(pool, &token).await?;
    if updated { log.info("👋 Unsubscribed"); }
    else { log.warn("⚠️  Token not found or already unsubscribed"); }
    if telemetry::config::json_mode() {
        log.result(&SubscriberTokenResult { updated })?;
    }
    Ok(())
}

#[derive(Serialize)]
struct SubscriberList {
    subscribers: Vec<crate::store::Subscriber>,
}

async fn ls(pool: &PgPool, all: bool) -> Result<()> {
    let log = telemetry::subscriber();
    let _g = log.root_span_kv([("all", all.to_string())]).entered();
    let _s = log.span(&SubPhase::List).entered();
    let subscribers = db::list_subscribers(pool, all).await?;
    log.info("👥 Subscribers:");
    for sub in &subscribers {
        log.info(format!(
            "[{}] {} confirmed={} unsubscribed={}",
            sub.subscriber_id,
            sub.email,
            sub.confirmed,
            sub.unsubscribed_at.is_some()
        ));
    }
    if telemetry::config::json_mode() {
        log.result(&SubscriberList { subscribers })?;
    }
    Ok(())
}
