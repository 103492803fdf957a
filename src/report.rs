use crate::analyzer::{ReducedReport, Signal};
use crate::error::{AppError, Result};
use crate::models::IntervalClass;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use comfy_table::{
    Attribute, Cell, Color, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_BORDERS_ONLY,
};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

const TIMESTAMP_FORMAT: &str = "%d_%m_%Y--%H_%M_%S";

/// Identity of one persisted report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportName {
    pub interval: IntervalClass,
    pub currency: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl ReportName {
    /// `<interval>_<currency>[-<timestamp>]`, with path separators in the
    /// currency replaced so the name stays a single path component.
    pub fn stem(&self) -> String {
        let currency: String = self
            .currency
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        match self.timestamp {
            Some(ts) => format!("{}_{}-{}", self.interval, currency, ts.format(TIMESTAMP_FORMAT)),
            None => format!("{}_{}", self.interval, currency),
        }
    }
}

/// Where reduced reports end up.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Persists `report` and returns the location it was written to.
    async fn write(&self, report: &ReducedReport, name: &ReportName) -> Result<PathBuf>;
}

/// File format of persisted reports.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Xlsx => "xlsx",
            ReportFormat::Csv => "csv",
        }
    }

    pub fn sink<P: AsRef<Path>>(self, base_dir: P) -> Arc<dyn ReportSink> {
        match self {
            ReportFormat::Xlsx => Arc::new(XlsxReportSink::new(base_dir)),
            ReportFormat::Csv => Arc::new(CsvReportSink::new(base_dir)),
        }
    }
}

/// Writes `bytes` to `<base_dir>/<file_name>` through a `.tmp` sibling and a rename,
/// so readers never see a half-written file. The sibling is removed if either step fails.
async fn write_atomically(base_dir: &Path, file_name: &str, bytes: Vec<u8>) -> Result<PathBuf> {
    let final_path = base_dir.join(file_name);
    let sink_err = |e: std::io::Error| AppError::Sink {
        path: final_path.clone(),
        reason: e.to_string(),
    };

    if !base_dir.exists() {
        fs::create_dir_all(base_dir).await.map_err(sink_err)?;
    }

    let tmp_path = base_dir.join(format!("{file_name}.tmp"));
    let written = match fs::write(&tmp_path, bytes).await {
        Ok(()) => fs::rename(&tmp_path, &final_path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(sink_err(e));
    }
    Ok(final_path)
}

/// Writes `<stem>.csv` files into a directory.
pub struct CsvReportSink {
    pub base_dir: PathBuf,
}

impl CsvReportSink {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, name: &ReportName) -> PathBuf {
        self.base_dir.join(file_name(name, ReportFormat::Csv))
    }
}

fn file_name(name: &ReportName, format: ReportFormat) -> String {
    format!("{}.{}", name.stem(), format.extension())
}

fn header(report: &ReducedReport) -> Vec<String> {
    let mut header = vec!["bar".to_string(), "date".to_string()];
    header.extend(report.columns.iter().map(|c| c.header()));
    header
}

/// Header row plus one row per retained bar; unlabeled cells stay empty.
pub fn encode_csv(report: &ReducedReport) -> std::result::Result<Vec<u8>, String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header(report)).map_err(|e| e.to_string())?;

    for row in &report.rows {
        let mut record = vec![row.bar_index.to_string(), row.date.clone()];
        record.extend(
            row.cells
                .iter()
                .map(|cell| cell.map(|s| s.label()).unwrap_or_default().to_string()),
        );
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }

    writer.into_inner().map_err(|e| e.to_string())
}

#[async_trait]
impl ReportSink for CsvReportSink {
    async fn write(&self, report: &ReducedReport, name: &ReportName) -> Result<PathBuf> {
        let bytes = encode_csv(report).map_err(|reason| AppError::Sink {
            path: self.path_for(name),
            reason,
        })?;
        write_atomically(&self.base_dir, &file_name(name, ReportFormat::Csv), bytes).await
    }
}

/// Writes `<stem>.xlsx` workbooks into a directory.
pub struct XlsxReportSink {
    pub base_dir: PathBuf,
}

impl XlsxReportSink {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, name: &ReportName) -> PathBuf {
        self.base_dir.join(file_name(name, ReportFormat::Xlsx))
    }
}

/// One worksheet with the same layout as the CSV: a bold header, then the bar
/// position as a number, the date, and one label column per pattern.
pub fn encode_xlsx(report: &ReducedReport) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, title) in (0u16..).zip(header(report)) {
        sheet.write_string_with_format(0, col, title, &bold)?;
    }
    for (row_num, row) in (1u32..).zip(&report.rows) {
        sheet.write_number(row_num, 0, row.bar_index as f64)?;
        sheet.write_string(row_num, 1, row.date.as_str())?;
        for (col, cell) in (2u16..).zip(&row.cells) {
            if let Some(signal) = cell {
                sheet.write_string(row_num, col, signal.label())?;
            }
        }
    }

    workbook.save_to_buffer()
}

#[async_trait]
impl ReportSink for XlsxReportSink {
    async fn write(&self, report: &ReducedReport, name: &ReportName) -> Result<PathBuf> {
        let bytes = encode_xlsx(report).map_err(|e| AppError::Sink {
            path: self.path_for(name),
            reason: e.to_string(),
        })?;
        write_atomically(&self.base_dir, &file_name(name, ReportFormat::Xlsx), bytes).await
    }
}

/// Console rendering of a report, used for debug logging.
pub fn render_table(report: &ReducedReport) -> Table {
    let mut table = Table::new();
    let mut header = vec![
        Cell::new("Bar").add_attribute(Attribute::Bold),
        Cell::new("Date").add_attribute(Attribute::Bold),
    ];
    header.extend(
        report
            .columns
            .iter()
            .map(|c| Cell::new(&c.name).add_attribute(Attribute::Bold)),
    );
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for row in &report.rows {
        let mut cells = vec![
            Cell::new(row.bar_index).fg(Color::DarkGrey),
            Cell::new(&row.date),
        ];
        cells.extend(row.cells.iter().map(|cell| match cell {
            Some(Signal::Bullish) => Cell::new(Signal::Bullish.label()).fg(Color::Green),
            Some(Signal::Bearish) => Cell::new(Signal::Bearish.label()).fg(Color::Red),
            None => Cell::new(""),
        }));
        table.add_row(cells);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{ReportColumn, ReportRow};
    use chrono::TimeZone;

    fn sample_report() -> ReducedReport {
        ReducedReport {
            columns: vec![
                ReportColumn {
                    id: "CDLDOJI".into(),
                    group: "Pattern Recognition".into(),
                    name: "Doji".into(),
                },
                ReportColumn {
                    id: "CDLENGULFING".into(),
                    group: "Pattern Recognition".into(),
                    name: "Engulfing Pattern".into(),
                },
            ],
            rows: vec![ReportRow {
                bar_index: 4,
                date: "2024-03-05".into(),
                cells: vec![None, Some(Signal::Bearish)],
            }],
        }
    }

    #[test]
    fn stem_follows_naming_convention() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 14, 9, 5, 7).unwrap();
        let mut name = ReportName {
            interval: IntervalClass::Hourly,
            currency: "EURUSD".into(),
            timestamp: Some(ts),
        };
        assert_eq!(name.stem(), "hourly_EURUSD-14_03_2024--09_05_07");
        name.timestamp = None;
        name.currency = "EUR/USD".into();
        assert_eq!(name.stem(), "hourly_EUR_USD");
    }

    #[test]
    fn csv_has_header_and_labeled_cells() {
        let text = String::from_utf8(encode_csv(&sample_report()).unwrap()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "bar,date,Pattern Recognition: Doji (CDLDOJI),Pattern Recognition: Engulfing Pattern (CDLENGULFING)"
        );
        assert_eq!(lines[1], "4,2024-03-05,,Bearish trend");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn empty_report_encodes_header_only() {
        let text = String::from_utf8(encode_csv(&ReducedReport::default()).unwrap()).unwrap();
        assert_eq!(text.trim_end(), "bar,date");
    }

    #[tokio::test]
    async fn csv_sink_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvReportSink::new(dir.path().join("reports"));
        let name = ReportName {
            interval: IntervalClass::Daily,
            currency: "GBPUSD".into(),
            timestamp: None,
        };
        let path = sink.write(&ReducedReport::default(), &name).await.unwrap();
        assert_eq!(path, dir.path().join("reports").join("daily_GBPUSD.csv"));
        assert_eq!(std::fs::read_to_string(path).unwrap().trim_end(), "bar,date");
    }

    #[tokio::test]
    async fn unwritable_target_is_a_sink_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let sink = CsvReportSink::new(&blocker);
        let name = ReportName {
            interval: IntervalClass::Daily,
            currency: "GBPUSD".into(),
            timestamp: None,
        };
        let err = sink.write(&sample_report(), &name).await.unwrap_err();
        assert!(matches!(err, AppError::Sink { .. }));
    }

    #[tokio::test]
    async fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let reports = dir.path().join("reports");
        // a non-empty directory sits where the report should go
        std::fs::create_dir_all(reports.join("daily_GBPUSD.csv")).unwrap();
        std::fs::write(reports.join("daily_GBPUSD.csv").join("keep"), b"x").unwrap();

        let sink = CsvReportSink::new(&reports);
        let name = ReportName {
            interval: IntervalClass::Daily,
            currency: "GBPUSD".into(),
            timestamp: None,
        };
        let err = sink.write(&sample_report(), &name).await.unwrap_err();
        assert!(matches!(err, AppError::Sink { .. }));
        assert!(!reports.join("daily_GBPUSD.csv.tmp").exists());
    }

    #[test]
    fn xlsx_encodes_a_zip_workbook() {
        let bytes = encode_xlsx(&sample_report()).unwrap();
        assert_eq!(&bytes[..2], b"PK");
        assert!(!encode_xlsx(&ReducedReport::default()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn xlsx_sink_names_files_by_format() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ReportFormat::default().sink(dir.path());
        let name = ReportName {
            interval: IntervalClass::Hourly,
            currency: "EURUSD".into(),
            timestamp: None,
        };
        let path = sink.write(&sample_report(), &name).await.unwrap();
        assert_eq!(path, dir.path().join("hourly_EURUSD.xlsx"));
        assert_eq!(&std::fs::read(&path).unwrap()[..2], b"PK");
        assert!(!dir.path().join("hourly_EURUSD.xlsx.tmp").exists());
    }

    #[test]
    fn formats_use_lowercase_names() {
        let csv: ReportFormat = serde_json::from_str("\"csv\"").unwrap();
        assert_eq!(csv, ReportFormat::Csv);
        assert_eq!(ReportFormat::default().extension(), "xlsx");
    }

    #[test]
    fn table_lists_every_row() {
        let rendered = render_table(&sample_report()).to_string();
        assert!(rendered.contains("Engulfing Pattern"));
        assert!(rendered.contains("Bearish trend"));
    }
}
