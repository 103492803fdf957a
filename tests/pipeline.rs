use async_trait::async_trait;
use candle_reporter::analyzer::PatternAnalyzer;
use candle_reporter::config::AppConfig;
use candle_reporter::error::{AppError, Result};
use candle_reporter::fetcher::{DataFetcher, QuoteRequest, QuoteSource};
use candle_reporter::models::{Credential, IntervalClass};
use candle_reporter::scheduler::{IntervalScheduler, Shutdown};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tracing::Span;

/// Engulfing pair for EURUSD, a flat series for USDJPY, outage for GBPUSD.
struct FakeProvider;

#[async_trait]
impl QuoteSource for FakeProvider {
    async fn fetch(&self, request: &QuoteRequest<'_>) -> Result<Value> {
        match request.currency {
            "EURUSD" => Ok(json!({
                "quotes": [
                    { "date": "2024-03-01", "open": 1.05, "high": 1.2, "low": 0.9, "close": 1.1 },
                    { "date": "2024-03-02", "open": "1.15", "high": "1.2", "low": "0.95", "close": "1.0" },
                    { "date": "2024-03-03", "open": 0.95, "high": 1.3, "low": 0.9, "close": 1.25 }
                ]
            })),
            "USDJPY" => Ok(json!({
                "quotes": [
                    { "date": "2024-03-01", "open": 150, "high": 150, "low": 150, "close": 150 },
                    { "date": "2024-03-02", "open": 150, "high": 150, "low": 150, "close": 150 }
                ]
            })),
            other => Err(AppError::Fetch {
                currency: other.to_string(),
                reason: "service unavailable".to_string(),
            }),
        }
    }
}

fn scheduler(reports: &Path, extra: Value) -> IntervalScheduler {
    let mut raw = json!({
        "api_keys": ["k1"],
        "currencies": ["EURUSD", "GBPUSD", "USDJPY"],
        "intervals": ["daily"],
        "patterns": ["CDLENGULFING"],
        "reports": { "dir": reports, "format": "csv", "timestamped": false }
    });
    if let (Some(base), Some(extra)) = (raw.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    let config: AppConfig = serde_json::from_value(raw).unwrap();
    let resolved = config.validate().unwrap();

    let credentials: Arc<[Credential]> = config.api_keys.clone().into();
    let fetcher = DataFetcher::new(Arc::new(FakeProvider), credentials, config.fetch.on_failure, Span::none()).unwrap();
    let analyzer = PatternAnalyzer::new(Arc::new(resolved.catalog), Span::none());
    IntervalScheduler::new(
        resolved.intervals[0],
        resolved.currencies,
        fetcher,
        analyzer,
        config.reports.sink(),
        config.reports.scheduler_settings(),
        Shutdown::new(),
        Span::none(),
    )
}

#[tokio::test]
async fn cycle_writes_one_report_per_fetched_currency() {
    let dir = tempfile::tempdir().unwrap();
    let reports = dir.path().join("reports");
    let scheduler = scheduler(&reports, json!({}));
    assert_eq!(scheduler.interval(), IntervalClass::Daily);

    let summary = scheduler.run_once().await;
    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.exported, 2);
    assert_eq!(summary.failed_fetch, ["GBPUSD"]);

    let eurusd = std::fs::read_to_string(reports.join("daily_EURUSD.csv")).unwrap();
    let lines: Vec<_> = eurusd.lines().collect();
    assert_eq!(
        lines,
        [
            "bar,date,Pattern Recognition: Engulfing Pattern (CDLENGULFING)",
            "1,2024-03-02,Bearish trend",
            "2,2024-03-03,Bullish trend",
        ]
    );

    // Nothing fired, so only the header survives.
    let usdjpy = std::fs::read_to_string(reports.join("daily_USDJPY.csv")).unwrap();
    assert_eq!(usdjpy.trim_end(), "bar,date");

    assert!(!reports.join("daily_GBPUSD.csv").exists());
}

#[tokio::test]
async fn unwritable_report_dir_fails_exports_but_not_the_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("reports");
    std::fs::write(&blocker, b"file in the way").unwrap();

    let summary = scheduler(&blocker, json!({ "currencies": ["EURUSD", "USDJPY"] }))
        .run_once()
        .await;
    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.exported, 0);
    assert_eq!(summary.failed_export, ["EURUSD", "USDJPY"]);
}

#[tokio::test]
async fn timestamped_names_use_the_cycle_start() {
    let dir = tempfile::tempdir().unwrap();
    let reports = dir.path().join("reports");
    let scheduler = scheduler(
        &reports,
        json!({
            "currencies": ["EURUSD"],
            "reports": { "dir": reports, "format": "csv", "timestamped": true }
        }),
    );
    scheduler.run_once().await;

    let names: Vec<String> = std::fs::read_dir(&reports)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("daily_EURUSD-"));
    assert!(names[0].ends_with(".csv"));
}

#[tokio::test]
async fn default_format_writes_workbooks() {
    let dir = tempfile::tempdir().unwrap();
    let reports = dir.path().join("reports");
    let summary = scheduler(
        &reports,
        json!({
            "currencies": ["EURUSD", "EURUSD"],
            "reports": { "dir": reports, "timestamped": false }
        }),
    )
    .run_once()
    .await;
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.exported, 1);

    let bytes = std::fs::read(reports.join("daily_EURUSD.xlsx")).unwrap();
    assert_eq!(&bytes[..2], b"PK");
    assert!(!reports.join("daily_EURUSD.csv").exists());
}
