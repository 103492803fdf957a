//! Periodic FX candlestick reports.
//!
//! Each configured interval runs its own scheduler: fetch a lookback window of
//! quotes per currency, run the pattern catalog over it, keep only the bars and
//! patterns that fired, and write the result as a spreadsheet (or CSV) report.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod patterns;
pub mod report;
pub mod scheduler;

pub use analyzer::{PatternAnalyzer, ReducedReport, Signal};
pub use config::AppConfig;
pub use error::{AppError, Result};
pub use fetcher::{DataFetcher, HttpQuoteSource, QuoteSource};
pub use report::{CsvReportSink, ReportFormat, ReportSink, XlsxReportSink};
pub use scheduler::{IntervalScheduler, Shutdown};
