use crate::analyzer::PatternAnalyzer;
use crate::fetcher::DataFetcher;
use crate::models::IntervalClass;
use crate::report::{ReportName, ReportSink};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{Instrument, Span, error, info, warn};

/// Cooperative shutdown signal shared by every scheduler unit.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once `trigger` has been called.
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        // The sender lives in `self`, so this only returns once the flag is set.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

/// What a failed report export means for the cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportPolicy {
    /// Log it; the cycle still counts as complete.
    #[default]
    BestEffort,
    /// Run the cycle again after the retry delay instead of waiting for the boundary.
    Strict,
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub timestamped_reports: bool,
    pub export_policy: ExportPolicy,
    pub retry_delay: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            timestamped_reports: true,
            export_policy: ExportPolicy::BestEffort,
            retry_delay: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Default)]
pub struct CycleSummary {
    pub fetched: usize,
    pub exported: usize,
    pub failed_fetch: Vec<String>,
    pub failed_analysis: Vec<String>,
    pub failed_export: Vec<String>,
    pub skipped: Vec<String>,
    pub cancelled: bool,
}

enum SchedulerState {
    RunningCycle,
    Waiting(Duration),
}

/// One independent fetch → analyze → export → sleep loop for a single interval.
pub struct IntervalScheduler {
    interval: IntervalClass,
    currencies: Vec<String>,
    fetcher: DataFetcher,
    analyzer: PatternAnalyzer,
    sink: Arc<dyn ReportSink>,
    settings: SchedulerSettings,
    shutdown: Shutdown,
    span: Span,
}

impl IntervalScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        interval: IntervalClass,
        currencies: Vec<String>,
        fetcher: DataFetcher,
        analyzer: PatternAnalyzer,
        sink: Arc<dyn ReportSink>,
        settings: SchedulerSettings,
        shutdown: Shutdown,
        span: Span,
    ) -> Self {
        Self {
            interval,
            currencies,
            fetcher,
            analyzer,
            sink,
            settings,
            shutdown,
            span,
        }
    }

    pub fn interval(&self) -> IntervalClass {
        self.interval
    }

    /// Runs cycles until shutdown, returning how many were started.
    /// Failures inside a cycle are logged and counted, never fatal to the loop.
    pub async fn run(self) -> u64 {
        let span = self.span.clone();
        self.run_loop().instrument(span).await
    }

    async fn run_loop(&self) -> u64 {
        info!("Start {} loop", self.interval);
        let mut iteration = 0u64;
        let mut state = SchedulerState::RunningCycle;

        loop {
            state = match state {
                SchedulerState::RunningCycle => {
                    if self.shutdown.is_triggered() {
                        break;
                    }
                    iteration += 1;
                    let summary = self.run_cycle(Utc::now()).await;
                    if summary.cancelled {
                        break;
                    }
                    SchedulerState::Waiting(self.next_wait(&summary, Utc::now()))
                }
                SchedulerState::Waiting(wait) => {
                    if self.shutdown.is_triggered() {
                        break;
                    }
                    info!(
                        iteration,
                        "Next {} report will be created in {} sec",
                        self.interval,
                        wait.as_secs()
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => SchedulerState::RunningCycle,
                        _ = self.shutdown.triggered() => break,
                    }
                }
            };
        }

        info!(iteration, "Stopped {} loop", self.interval);
        iteration
    }

    /// Single cycle under this scheduler's span.
    pub async fn run_once(&self) -> CycleSummary {
        self.run_cycle(Utc::now()).instrument(self.span.clone()).await
    }

    async fn run_cycle(&self, started_at: DateTime<Utc>) -> CycleSummary {
        let loop_start = Instant::now();
        let outcome = self
            .fetcher
            .fetch(self.interval, &self.currencies, started_at, &self.shutdown)
            .await;

        let mut summary = CycleSummary {
            fetched: outcome.payloads.len(),
            failed_fetch: outcome.failed,
            skipped: outcome.skipped,
            cancelled: outcome.cancelled,
            ..Default::default()
        };

        for currency in &self.currencies {
            let Some(payload) = outcome.payloads.get(currency) else {
                continue;
            };

            let report = match self.analyzer.analyze_payload(currency, payload) {
                Ok(report) => report,
                Err(e) => {
                    error!(currency = %currency, error = %e, "Analysis failed");
                    summary.failed_analysis.push(currency.clone());
                    continue;
                }
            };

            let name = ReportName {
                interval: self.interval,
                currency: currency.clone(),
                timestamp: self.settings.timestamped_reports.then_some(started_at),
            };
            match self.sink.write(&report, &name).await {
                Ok(path) => {
                    info!(currency = %currency, path = %path.display(), "Report has been created");
                    summary.exported += 1;
                }
                Err(e) => {
                    error!(currency = %currency, error = %e, "Report export failed");
                    summary.failed_export.push(currency.clone());
                }
            }
        }

        info!(
            fetched = summary.fetched,
            exported = summary.exported,
            failed_fetch = summary.failed_fetch.len(),
            failed_analysis = summary.failed_analysis.len(),
            failed_export = summary.failed_export.len(),
            skipped = summary.skipped.len(),
            duration_secs = loop_start.elapsed().as_secs_f64(),
            "Cycle completed"
        );
        summary
    }

    fn next_wait(&self, summary: &CycleSummary, now: DateTime<Utc>) -> Duration {
        let boundary = self.interval.until_next_boundary(now);
        if self.settings.export_policy == ExportPolicy::Strict && !summary.failed_export.is_empty() {
            warn!(
                failed = summary.failed_export.len(),
                "Exports failed, retrying before the next boundary"
            );
            return boundary.min(self.settings.retry_delay);
        }
        boundary
    }
}
