//! Pattern detection and reduction of a series to the bars and patterns that fired.

use crate::error::{AppError, Result};
use crate::models::RawSeries;
use crate::patterns::{PatternCatalog, PatternEntry};
use crate::report::render_table;
use serde_json::Value;
use std::sync::Arc;
use tracing::{Level, Span, debug, info};

pub const BEARISH_LABEL: &str = "Bearish trend";
pub const BULLISH_LABEL: &str = "Bullish trend";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Bearish,
    Bullish,
}

impl Signal {
    /// Only the two recognizer extremes carry a label; everything else is "no signal".
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -100 => Some(Signal::Bearish),
            100 => Some(Signal::Bullish),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Signal::Bearish => BEARISH_LABEL,
            Signal::Bullish => BULLISH_LABEL,
        }
    }
}

/// Integer-coded signals: one column per catalog entry, one row per bar.
#[derive(Debug, Clone)]
pub struct PatternMatrix {
    dates: Vec<String>,
    columns: Vec<PatternEntry>,
    // column-major, every column has `dates.len()` codes
    codes: Vec<Vec<i32>>,
}

impl PatternMatrix {
    pub fn compute(series: &RawSeries, catalog: &PatternCatalog) -> Result<Self> {
        let ohlc = series.columns();
        let rows = series.len();
        let mut codes = Vec::with_capacity(catalog.len());

        for entry in catalog.entries() {
            let column = (entry.recognizer)(&ohlc.open, &ohlc.high, &ohlc.low, &ohlc.close);
            if column.len() != rows {
                return Err(AppError::input(format!(
                    "{} produced {} codes for {} bars",
                    entry.id,
                    column.len(),
                    rows
                )));
            }
            codes.push(column);
        }

        Ok(Self {
            dates: series.bars.iter().map(|b| b.date.clone()).collect(),
            columns: catalog.entries().to_vec(),
            codes,
        })
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn code(&self, row: usize, column: usize) -> i32 {
        self.codes[column][row]
    }

    fn signal(&self, row: usize, column: usize) -> Option<Signal> {
        Signal::from_code(self.code(row, column))
    }

    /// Drops unlabeled rows, then columns unlabeled across the surviving rows.
    /// Both index sets are collected before anything is copied out.
    pub fn reduce(&self) -> ReducedReport {
        let columns = 0..self.column_count();

        let mut kept_rows: Vec<usize> = (0..self.row_count())
            .rev()
            .filter(|&row| columns.clone().any(|col| self.signal(row, col).is_some()))
            .collect();
        kept_rows.reverse();

        let kept_columns: Vec<usize> = columns
            .filter(|&col| kept_rows.iter().any(|&row| self.signal(row, col).is_some()))
            .collect();

        let rows = kept_rows
            .iter()
            .map(|&row| ReportRow {
                bar_index: row,
                date: self.dates[row].clone(),
                cells: kept_columns.iter().map(|&col| self.signal(row, col)).collect(),
            })
            .collect();

        ReducedReport {
            columns: kept_columns
                .iter()
                .map(|&col| ReportColumn::from(&self.columns[col]))
                .collect(),
            rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportColumn {
    pub id: String,
    pub group: String,
    pub name: String,
}

impl From<&PatternEntry> for ReportColumn {
    fn from(entry: &PatternEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            group: entry.group.to_string(),
            name: entry.name.to_string(),
        }
    }
}

impl ReportColumn {
    pub fn header(&self) -> String {
        format!("{}: {} ({})", self.group, self.name, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    /// Position of the bar in the fetched series.
    pub bar_index: usize,
    pub date: String,
    /// Aligned with `ReducedReport::columns`.
    pub cells: Vec<Option<Signal>>,
}

/// Bars where something fired, restricted to the patterns that fired there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReducedReport {
    pub columns: Vec<ReportColumn>,
    pub rows: Vec<ReportRow>,
}

impl ReducedReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }
}

/// Runs the catalog over a series and reduces the result.
pub fn analyze(series: &RawSeries, catalog: &PatternCatalog) -> Result<ReducedReport> {
    Ok(PatternMatrix::compute(series, catalog)?.reduce())
}

pub struct PatternAnalyzer {
    catalog: Arc<PatternCatalog>,
    span: Span,
}

impl PatternAnalyzer {
    pub fn new(catalog: Arc<PatternCatalog>, span: Span) -> Self {
        Self { catalog, span }
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Validates the provider payload for `currency` and analyzes it.
    pub fn analyze_payload(&self, currency: &str, payload: &Value) -> Result<ReducedReport> {
        let _enter = self.span.enter();

        let series = RawSeries::from_payload(payload).map_err(|e| e.for_currency(currency))?;
        let matrix = PatternMatrix::compute(&series, &self.catalog).map_err(|e| e.for_currency(currency))?;
        info!(
            currency,
            bars = matrix.row_count(),
            patterns = matrix.column_count(),
            "Patterns computed"
        );

        let report = matrix.reduce();
        info!(
            currency,
            rows = report.rows.len(),
            columns = report.columns.len(),
            "Patterns reduced"
        );
        if tracing::enabled!(Level::DEBUG) {
            debug!(currency, "\n{}", render_table(&report));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bar;

    fn flat_series(n: usize) -> RawSeries {
        RawSeries::new(
            (0..n)
                .map(|i| Bar {
                    date: format!("2024-03-{:02}", i + 1),
                    open: 1.0,
                    high: 1.0,
                    low: 1.0,
                    close: 1.0,
                })
                .collect(),
        )
    }

    fn short_output(_: &[f64], _: &[f64], _: &[f64], _: &[f64]) -> Vec<i32> {
        vec![100]
    }

    fn odd_codes(o: &[f64], _: &[f64], _: &[f64], _: &[f64]) -> Vec<i32> {
        (0..o.len()).map(|i| if i == 0 { 200 } else { -100 }).collect()
    }

    #[test]
    fn signal_from_code() {
        assert_eq!(Signal::from_code(-100), Some(Signal::Bearish));
        assert_eq!(Signal::from_code(100), Some(Signal::Bullish));
        assert_eq!(Signal::from_code(0), None);
        assert_eq!(Signal::from_code(200), None);
        assert_eq!(Signal::Bullish.label(), BULLISH_LABEL);
    }

    #[test]
    fn recognizer_with_wrong_length_is_an_input_error() {
        let catalog = PatternCatalog::from_entries(vec![PatternEntry::new("SHORT", "Short", short_output)]);
        let err = analyze(&flat_series(3), &catalog).unwrap_err();
        assert!(matches!(err, AppError::Input { .. }));
    }

    #[test]
    fn codes_other_than_extremes_are_unlabeled() {
        let catalog = PatternCatalog::from_entries(vec![PatternEntry::new("ODD", "Odd", odd_codes)]);
        let report = analyze(&flat_series(2), &catalog).unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].bar_index, 1);
        assert_eq!(report.rows[0].cells, vec![Some(Signal::Bearish)]);
    }

    #[test]
    fn empty_catalog_gives_empty_report() {
        let report = analyze(&flat_series(5), &PatternCatalog::from_entries(Vec::new())).unwrap();
        assert!(report.rows.is_empty());
        assert!(report.columns.is_empty());
        assert!(report.is_empty());
    }

    #[test]
    fn analyzer_tags_payload_errors_with_currency() {
        let analyzer = PatternAnalyzer::new(Arc::new(PatternCatalog::builtin()), Span::none());
        let err = analyzer
            .analyze_payload("EURUSD", &serde_json::json!({ "quotes": [{ "date": "x" }] }))
            .unwrap_err();
        assert!(err.to_string().contains("for EURUSD"));
    }
}
