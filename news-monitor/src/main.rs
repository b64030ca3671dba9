use anyhow::Context;
use clap::Parser;
use news_monitor::config::{ENV_DATABASE_URL, ENV_QUERY, ENV_TABLE};
use news_monitor::display::render_report;
use news_monitor::{
    sort_newest_first, Fetcher, JsonFileRegistry, JsonlSink, MonitorConfig, NewsMonitor, PgSink, RecordSink,
    RunRequest,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "news-monitor", about = "Poll RSS/Atom feeds and keep entries matching a boolean query")]
struct Args {
    /// JSON file listing the feeds to poll
    #[arg(short, long, env = "NEWS_MONITOR_FEEDS")]
    feeds: PathBuf,

    /// Boolean query, e.g. "wagner" OR "Africa Corps" AND NOT "football"
    #[arg(short, long, env = ENV_QUERY)]
    query: Option<String>,

    /// Only keep entries from the last N days (1-30)
    #[arg(short, long, default_value_t = 7)]
    days: u32,

    /// PostgreSQL connection string for exporting results
    #[arg(long, env = ENV_DATABASE_URL)]
    database_url: Option<String>,

    #[arg(long, env = ENV_TABLE, default_value = "headlines")]
    table: String,

    /// Append results to this JSON-lines file instead of a database
    #[arg(long, conflicts_with = "database_url")]
    jsonl: Option<PathBuf>,

    /// Repeat the run every N seconds until interrupted
    #[arg(long)]
    watch: Option<u64>,

    #[arg(long, default_value_t = 8)]
    concurrency: usize,

    /// Per-feed fetch timeout in seconds
    #[arg(long, default_value_t = 20)]
    timeout: u64,

    /// Print results newest first instead of feed order
    #[arg(long)]
    sort: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let mut config = MonitorConfig::from_env();
    config.max_concurrent_fetches = args.concurrency;
    config.fetch.timeout_seconds = args.timeout;
    config.database_url = args.database_url.clone();
    config.table_name = args.table.clone();

    let fetcher = Fetcher::new(config.fetch.clone()).context("building HTTP client")?;
    let registry = JsonFileRegistry::new(&args.feeds);

    let sink = build_sink(&args, &config).await?;
    let mut monitor = NewsMonitor::new(config, Arc::new(registry), Arc::new(fetcher))?;
    if let Some(sink) = sink {
        monitor = monitor.with_sink(sink);
    }

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping");
                shutdown.cancel();
            }
        });
    }

    let request = RunRequest {
        query: args.query.clone(),
        window_days: Some(args.days),
    };

    loop {
        let mut report = monitor.run(&request, &shutdown).await?;
        if args.sort {
            sort_newest_first(&mut report.records);
        }

        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", render_report(&report));
        }

        let failed = report.failed_sources();
        if !failed.is_empty() {
            info!("Sources with problems: {}", failed.join(", "));
        }
        if report.export.is_failed() {
            error!("Results were not exported this run");
        }

        let Some(every) = args.watch else { break };
        if shutdown.is_cancelled() {
            break;
        }
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(every.max(1))) => {}
        }
    }

    Ok(())
}

async fn build_sink(args: &Args, config: &MonitorConfig) -> anyhow::Result<Option<Arc<dyn RecordSink>>> {
    if let Some(database_url) = &config.database_url {
        info!(
            "Exporting to {}",
            config.redacted_database_url().unwrap_or_default()
        );
        let sink = PgSink::connect(database_url, &config.table_name)
            .await
            .map_err(|e| {
                error!("Failed to connect to database: {}", e);
                e
            })?;
        sink.setup_schema().await?;
        return Ok(Some(Arc::new(sink)));
    }
    if let Some(path) = &args.jsonl {
        info!("Exporting to {}", path.display());
        return Ok(Some(Arc::new(JsonlSink::new(path))));
    }
    Ok(None)
}
