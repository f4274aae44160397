use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::PgPool;
use std::env;

mod delivery;
mod enrich;
mod feeds;
mod ingestion;
mod init;
mod llm;
mod maintenance;
mod pipeline;
mod stats;
mod store;
mod subscribers;
mod telemetry;
mod util;

#[derive(Parser)]
#[command(name = "newsy", about = "AI news digest pipeline CLI")]
struct Cli {
    #[arg(global = true, short, long)]
    dsn: Option<String>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or migrate the database schema
    Init,
    Feed(feeds::FeedCmd),
    Fetch(ingestion::FetchCmd),
    Classify(pipeline::classify::ClassifyCmd),
    Compose(pipeline::compose::ComposeCmd),
    Subscriber(subscribers::SubscriberCmd),
    Gc(maintenance::gc::GcCmd),
    Stats(stats::StatsCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and NEWSY_LOG_FORMAT
    telemetry::config::init_tracing();
    let dsn = cli
        .dsn
        .or_else(|| env::var("DATABASE_URL").ok())
        .context("Please provide --dsn or set DATABASE_URL in .env")?;

    let pool = PgPool::connect(&dsn).await?;

    match cli.command {
        Commands::Init => init::run(&pool).await?,
        Commands::Feed(args) => feeds::run(&pool, args).await?,
        Commands::Fetch(args) => ingestion::run(&pool, args).await?,
        Commands::Classify(args) => pipeline::classify::run(&pool, args).await?,
        Commands::Compose(args) => pipeline::compose::run(&pool, args).await?,
        Commands::Subscriber(args) => subscribers::run(&pool, args).await?,
        Commands::Gc(args) => maintenance::gc::run(&pool, args).await?,
        Commands::Stats(args) => stats::run(&pool, args).await?,
    }

    Ok(())
}
