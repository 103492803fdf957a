use anyhow::Context;
use candle_reporter::config::AppConfig;
use candle_reporter::fetcher::{DataFetcher, HttpQuoteSource, QuoteSource};
use candle_reporter::models::Credential;
use candle_reporter::scheduler::{IntervalScheduler, Shutdown};
use candle_reporter::PatternAnalyzer;
use clap::Parser;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, info_span};

/// Periodic candlestick pattern reports for FX pairs.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Config file (defaults to config.json next to the binary)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides `reports.dir`
    #[arg(long)]
    reports_dir: Option<PathBuf>,

    /// Interval to run, repeatable; overrides `intervals`
    #[arg(long = "interval", value_name = "NAME")]
    intervals: Vec<String>,

    /// Run one cycle per interval and exit
    #[arg(long)]
    once: bool,
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Step 1: Configuration
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path).await,
        None => AppConfig::load_default().await,
    }
    .context("Failed to load configuration")?;
    init_tracing(&config.log_level);

    if let Some(dir) = args.reports_dir {
        config.reports.dir = dir;
    }
    if !args.intervals.is_empty() {
        config.intervals = args.intervals;
    }
    let resolved = config.validate().context("Invalid configuration")?;
    info!(
        currencies = resolved.currencies.len(),
        credentials = config.api_keys.len(),
        patterns = resolved.catalog.len(),
        "Configuration loaded"
    );

    // Step 2: Shared components
    let source: Arc<dyn QuoteSource> = Arc::new(HttpQuoteSource::new(config.provider.base_url.clone())?);
    let sink = config.reports.sink();
    let catalog = Arc::new(resolved.catalog);
    let credentials: Arc<[Credential]> = config.api_keys.clone().into();
    let shutdown = Shutdown::new();

    // Step 3: One scheduler per interval, each with its own copies of the inputs
    let mut schedulers = Vec::with_capacity(resolved.intervals.len());
    for interval in resolved.intervals {
        let span = info_span!("scheduler", %interval);
        let fetcher = DataFetcher::new(
            source.clone(),
            credentials.clone(),
            config.fetch.on_failure,
            info_span!(parent: &span, "fetcher"),
        )
        .with_context(|| format!("Failed to build the {interval} fetcher"))?;
        let analyzer = PatternAnalyzer::new(catalog.clone(), info_span!(parent: &span, "analyzer"));
        schedulers.push(IntervalScheduler::new(
            interval,
            resolved.currencies.clone(),
            fetcher,
            analyzer,
            sink.clone(),
            config.reports.scheduler_settings(),
            shutdown.clone(),
            span,
        ));
    }

    if args.once {
        let summaries = join_all(schedulers.iter().map(|s| s.run_once())).await;
        for (scheduler, summary) in schedulers.iter().zip(summaries) {
            info!(interval = %scheduler.interval(), exported = summary.exported, "Single run finished");
        }
        return Ok(());
    }

    // Step 4: Run until Ctrl-C
    let stop = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            stop.trigger();
        }
    });

    let handles = schedulers.into_iter().map(|scheduler| {
        let interval = scheduler.interval();
        async move { (interval, tokio::spawn(scheduler.run()).await) }
    });

    let mut failed = false;
    for (interval, joined) in join_all(handles).await {
        match joined {
            Ok(cycles) => info!(%interval, cycles, "Scheduler stopped"),
            Err(e) => {
                error!(%interval, error = %e, "Scheduler task panicked");
                failed = true;
            }
        }
    }

    if failed {
        anyhow::bail!("at least one scheduler terminated abnormally");
    }
    Ok(())
}
