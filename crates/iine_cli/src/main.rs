mod duration;

use anyhow::Context;
use clap::Parser;
use iine_collector::{collect, CollectReport, Collector, QiitaClient};
use iine_core::logging::init_logging;
use iine_core::{ArticleStore, ChangeRecord, CollectorConfig, InvocationResult, NotifierConfig};
use iine_notifier::notifier_from_config;
use iine_storage::{create_store, StoreConfig, DEFAULT_DB_PATH};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use duration::HumanDuration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Collects Qiita like counts and notifies new likers", long_about = None)]
pub struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, default_value = "sqlite")]
    storage: String,
    /// SQLite database file
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    db_path: PathBuf,
    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Poll the article listing and record changed like counts
    Collect {
        /// Keep polling with this interval (e.g. 15m, 1h)
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    /// Notify new likers for a batch of change records
    Notify {
        /// JSON file with change records, `-` for stdin
        #[arg(long, default_value = "-")]
        events: String,
    },
    /// Collect, then notify every pending change in the store
    Run {
        /// Change records handed to the notifier at once
        #[arg(long, default_value_t = 100)]
        batch_size: usize,
    },
    /// Print the stored articles
    List,
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn read_events(source: &str) -> anyhow::Result<Vec<ChangeRecord>> {
    let mut raw = String::new();
    if source == "-" {
        std::io::stdin().read_to_string(&mut raw).context("Failed to read events from stdin")?;
    } else {
        raw = std::fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))?;
    }
    let value: serde_json::Value = serde_json::from_str(&raw).context("Events are not valid JSON")?;
    Ok(iine_core::stream::decode_batch(value)?)
}

async fn collect_with_report(config: &CollectorConfig, store: Arc<dyn ArticleStore>) -> iine_core::Result<CollectReport> {
    let client = QiitaClient::new(config.api_token.clone())?.with_listing_url(config.listing_url.clone());
    Collector::new(Arc::new(client), store, config.page_size).run_with_report().await
}

async fn run_pipeline(store: Arc<dyn ArticleStore>, batch_size: usize) -> anyhow::Result<InvocationResult> {
    let collector_config = CollectorConfig::from_env()?;
    let notifier_config = NotifierConfig::from_env()?;

    let report = collect_with_report(&collector_config, store.clone()).await?;
    info!("📥 Collected {} articles ({} changed)", report.fetched, report.modified);

    let notifier = notifier_from_config(&notifier_config)?;
    Ok(notifier.drain(store.as_ref(), batch_size).await?)
}

async fn open_store(kind: &str, db_path: &Path) -> anyhow::Result<Arc<dyn ArticleStore>> {
    let store_config = StoreConfig {
        db_path: db_path.to_path_buf(),
    };
    let store = create_store(kind, &store_config).await?;
    info!("💾 Storage ready (using {})", kind);
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(cli).await
}

/// The store is opened only by the commands that read or write it.
async fn execute(cli: Cli) -> anyhow::Result<()> {
    let result = match cli.command {
        Commands::Collect { interval } => {
            let config = CollectorConfig::from_env()?;
            let store = open_store(&cli.storage, &cli.db_path).await?;
            match interval {
                Some(interval) => {
                    info!("Running in periodic mode with {}s interval", interval.0.as_secs());
                    loop {
                        match collect(&config, store.clone()).await {
                            Ok(result) => print_json(&result)?,
                            Err(e) => error!("Collector run failed: {}", e),
                        }
                        tokio::time::sleep(interval.0).await;
                    }
                }
                None => collect(&config, store).await?,
            }
        }
        Commands::Notify { events } => {
            let batch = read_events(&events)?;
            let config = NotifierConfig::from_env()?;
            let response = iine_notifier::notify(&config, &batch).await?;
            print_json(&response)?;
            if response.status_code != InvocationResult::OK.status_code {
                anyhow::bail!("{} of {} records failed", response.failed(), batch.len());
            }
            return Ok(());
        }
        Commands::Run { batch_size } => run_pipeline(open_store(&cli.storage, &cli.db_path).await?, batch_size).await?,
        Commands::List => {
            for record in open_store(&cli.storage, &cli.db_path).await?.list().await? {
                println!("{}\t{}\t{}", record.id, record.like_count, record.title);
            }
            return Ok(());
        }
    };

    print_json(&result)?;
    if result.status_code != InvocationResult::OK.status_code {
        anyhow::bail!("run finished with status {}", result.status_code);
    }
    Ok(())
}
