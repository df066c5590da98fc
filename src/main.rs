use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};
use uuid::Uuid;

use feedpump::config::Config;
use feedpump::feed::HttpFetcher;
use feedpump::ingest::{Ingestor, IntervalTicker, Scheduler, Shutdown, ShutdownTrigger};
use feedpump::storage::{Database, EntryStore, StoreError};

#[derive(Parser, Debug)]
#[command(name = "feedpump", about = "Headless RSS ingestion daemon")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, value_name = "FILE", default_value = "feedpump.toml")]
    config: PathBuf,

    /// Override the database path
    #[arg(long, value_name = "PATH", global = true)]
    database: Option<String>,

    /// Override the number of feeds ingested in parallel
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Override the seconds between ticks
    #[arg(long, global = true)]
    interval_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect feeds on a schedule until interrupted
    Run,
    /// Create an account and print its id
    AddAccount {
        #[arg(long)]
        name: String,
    },
    /// Subscribe an account to a feed and print the feed id
    AddFeed {
        #[arg(long)]
        account: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
    },
    /// List every feed with its last fetch time
    ListFeeds,
    /// Run a single collection cycle and print the result
    IngestOnce,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging comes up first so config loading can report unknown keys
    let filter_handle = init_tracing();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if let Some(database) = args.database {
        config.database_path = database;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(interval) = args.interval_secs {
        config.interval_secs = interval;
    }
    config.validate()?;

    if let Some(handle) = filter_handle {
        if let Err(e) = handle.reload(EnvFilter::new(&config.log_level)) {
            tracing::warn!(level = %config.log_level, error = %e, "Failed to apply configured log level");
        }
    }

    let db = Database::open(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_path))?;

    let result = match args.command {
        Command::Run => run(&config, db.clone()).await,
        Command::AddAccount { name } => {
            let account = db.create_account(&name).await.context("Failed to create account")?;
            println!("{}", account.id);
            Ok(())
        }
        Command::AddFeed { account, name, url } => {
            match db.get_account(account).await {
                Err(StoreError::NotFound) => anyhow::bail!("No account with id {account}"),
                other => {
                    other.context("Failed to look up account")?;
                }
            }
            let feed = db
                .create_feed(account, &name, &url)
                .await
                .with_context(|| format!("Failed to add feed {url}"))?;
            println!("{}", feed.id);
            Ok(())
        }
        Command::ListFeeds => list_feeds(&db).await,
        Command::IngestOnce => ingest_once(&config, db.clone()).await,
    };

    db.close().await;
    result
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise logging starts at `info` and the
/// returned handle swaps in the configured level once the config is read.
fn init_tracing() -> Option<reload::Handle<EnvFilter, Registry>> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
            None
        }
        Err(_) => {
            let (filter, handle) = reload::Layer::new(EnvFilter::new("info"));
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
            Some(handle)
        }
    }
}

fn build_scheduler(config: &Config, db: Database) -> Result<Scheduler> {
    let fetcher = HttpFetcher::new(config.fetch_timeout(), config.max_feed_bytes)
        .context("Failed to build HTTP client")?;
    let store: Arc<dyn EntryStore> = Arc::new(db);
    let ingestor = Arc::new(Ingestor::new(Arc::clone(&store), Arc::new(fetcher)));
    Ok(Scheduler::new(ingestor, store, config.concurrency))
}

async fn run(config: &Config, db: Database) -> Result<()> {
    let scheduler = build_scheduler(config, db)?;
    let (trigger, shutdown) = Shutdown::new();
    tokio::spawn(forward_signals(trigger));

    tracing::info!(
        interval_secs = config.interval_secs,
        concurrency = config.concurrency,
        "Starting feed collection"
    );
    scheduler
        .run(IntervalTicker::new(config.interval()), shutdown)
        .await;
    Ok(())
}

async fn ingest_once(config: &Config, db: Database) -> Result<()> {
    let scheduler = build_scheduler(config, db)?;
    let (trigger, shutdown) = Shutdown::new();
    tokio::spawn(forward_signals(trigger));

    let report = scheduler
        .run_tick(&shutdown)
        .await
        .context("Failed to select feeds")?;
    println!(
        "selected: {}, succeeded: {}, failed: {}",
        report.selected, report.succeeded, report.failed
    );
    Ok(())
}

async fn list_feeds(db: &Database) -> Result<()> {
    let feeds = db.list_feeds().await.context("Failed to load feeds")?;
    if feeds.is_empty() {
        println!("No feeds.");
        return Ok(());
    }
    for feed in feeds {
        let fetched = feed
            .last_fetched_at
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        println!("{}\t{}\t{}\t{}", feed.id, feed.name, feed.url, fetched);
    }
    Ok(())
}

/// Fire `trigger` on SIGINT or SIGTERM.
async fn forward_signals(trigger: ShutdownTrigger) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown requested, finishing in-flight feeds");
    trigger.trigger();
}
