pub mod counts;
pub mod deletes;
pub mod vacuum;

use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;
use sqlx::PgPool;

use crate::telemetry::ops::gc::Phase as GcPhase;
use crate::telemetry::{self};
use crate::util::time::parse_cutoff_str;

#[derive(clap::ValueEnum, Clone, Debug)]
pub enum VacuumMode {
    #[value(name = "analyze")]
    Analyze,
    #[value(name = "off")]
    Off,
}

/// Retention sweep: purge items and digest history older than the cutoff.
/// Orthogonal to composition — the unsent filter never sees purged rows.
#[derive(Args, Debug)]
pub struct GcCmd {
    #[arg(long, default_value_t = false)]
    pub apply: bool,
    /// Age cutoff: "30d", a date, or an RFC3339 timestamp
    #[arg(long, default_value = "30d")]
    pub older_than: String,
    /// Max rows deleted per table per run
    #[arg(long, default_value_t = 10_000)]
    pub max: i64,
    /// Also purge digest records older than the cutoff
    #[arg(long, default_value_t = true)]
    pub records: bool,
    #[arg(long, value_enum, default_value = "analyze")]
    pub vacuum: VacuumMode,
}

#[derive(Serialize)]
struct GcCounts {
    old_items: i64,
    old_digest_records: i64,
}

#[derive(Serialize)]
struct GcPlanOut {
    cutoff: String,
    max: i64,
    records: bool,
    vacuum: String,
    counts: GcCounts,
}

#[derive(Serialize)]
struct GcResultOut {
    deleted_items: u64,
    deleted_digest_records: u64,
    vacuum: String,
}

pub async fn run(pool: &PgPool, args: GcCmd) -> Result<()> {
    let Some(cutoff) = parse_cutoff_str(&args.older_than) else {
        bail!("Unparseable --older-than value: {}", args.older_than);
    };
    let execute = args.apply;
    let mode = if execute { "apply" } else { "plan" };

    let log = telemetry::gc();
    let _g = log
        .root_span_kv([
            ("mode", mode.to_string()),
            ("cutoff", cutoff.to_rfc3339()),
            ("max", args.max.to_string()),
            ("records", args.records.to_string()),
            ("vacuum", format!("{:?}", args.vacuum)),
        ])
        .entered();

    let _p = log.span(&GcPhase::Plan).entered();
    log.info(format!(
        "📝 GC plan — mode={} cutoff={} max={} records={} vacuum={:?}",
        mode,
        cutoff.to_rfc3339(),
        args.max,
        args.records,
        args.vacuum
    ));
    if !execute {
        log.info("   Use --apply to execute.");
    }
    drop(_p);

    let old_items = {
        let _s = log.span(&GcPhase::Count).entered();
        counts::count_old_items(pool, cutoff).await?
    };
    log.info(format!("🗃️  Items older than cutoff: {}", old_items));

    let old_records = {
        let _s = log.span(&GcPhase::Count).entered();
        counts::count_old_digest_records(pool, cutoff).await?
    };
    log.info(format!("🧾 Digest records older than cutoff: {}", old_records));

    if !execute {
        if telemetry::config::json_mode() {
            let plan = GcPlanOut {
                cutoff: cutoff.to_rfc3339(),
                max: args.max,
                records: args.records,
                vacuum: format!("{:?}", args.vacuum),
                counts: GcCounts { old_items, old_digest_records: old_records },
            };
            log.plan(&plan)?;
        }
        return Ok(());
    }

    let mut deleted_items = 0u64;
    if old_items > 0 {
        let _s = log.span(&GcPhase::Delete).entered();
        deleted_items = deletes::delete_old_items(pool, cutoff, args.max).await?;
        log.info(format!("🧹 Deleted {} item(s)", deleted_items));
    }

    let mut deleted_records = 0u64;
    if args.records && old_records > 0 {
        let _s = log.span(&GcPhase::Delete).entered();
        deleted_records = deletes::delete_old_digest_records(pool, cutoff, args.max).await?;
        log.info(format!("🧹 Deleted {} digest record(s)", deleted_records));
    }

    match args.vacuum {
        VacuumMode::Off => {}
        VacuumMode::Analyze => {
            let _s = log.span(&GcPhase::Analyze).entered();
            vacuum::analyze_tables(pool).await?;
            log.info("🔬 ANALYZE newsy.item, newsy.digest_record");
        }
    }

    if telemetry::config::json_mode() {
        let res = GcResultOut {
            deleted_items,
            deleted_digest_records: deleted_records,
            vacuum: format!("{:?}", args.vacuum),
        };
        log.result(&res)?;
    }

    Ok(())
}
