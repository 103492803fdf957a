use crate::error::{AppError, Result};
use crate::fetcher::{DEFAULT_TIMESERIES_URL, FailurePolicy};
use crate::models::{Credential, IntervalClass};
use crate::patterns::PatternCatalog;
use crate::report::{ReportFormat, ReportSink};
use crate::scheduler::{ExportPolicy, SchedulerSettings};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;

pub const DEFAULT_CONFIG_NAME: &str = "config";

// CONFIGURATION STRUCTS

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct FetchConfig {
    #[serde(default)]
    pub on_failure: FailurePolicy,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReportsConfig {
    #[serde(default = "default_reports_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub format: ReportFormat,
    #[serde(default = "default_true")]
    pub timestamped: bool,
    #[serde(default)]
    pub export_policy: ExportPolicy,
    #[serde(default = "default_retry_secs")]
    pub retry_secs: u64,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            dir: default_reports_dir(),
            format: ReportFormat::default(),
            timestamped: true,
            export_policy: ExportPolicy::default(),
            retry_secs: default_retry_secs(),
        }
    }
}

impl ReportsConfig {
    pub fn sink(&self) -> Arc<dyn ReportSink> {
        self.format.sink(&self.dir)
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            timestamped_reports: self.timestamped,
            export_policy: self.export_policy,
            retry_delay: Duration::from_secs(self.retry_secs),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    // Tried in order; a rejected key hands the remaining currencies to the next one.
    pub api_keys: Vec<Credential>,
    pub currencies: Vec<String>,
    #[serde(default = "default_intervals")]
    pub intervals: Vec<String>,
    // None means the whole built-in catalog.
    #[serde(default)]
    pub patterns: Option<Vec<String>>,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
}

/// The parts of `AppConfig` that need checking before anything starts.
#[derive(Debug)]
pub struct ResolvedConfig {
    // Deduplicated, first occurrence wins.
    pub currencies: Vec<String>,
    pub intervals: Vec<IntervalClass>,
    pub catalog: PatternCatalog,
}

impl AppConfig {
    /// Loads `config.json` from the directory holding the running binary.
    pub async fn load_default() -> Result<Self> {
        AsyncStorageManager::new_relative("")?
            .load(DEFAULT_CONFIG_NAME)
            .await
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::Config(format!("{} is not a file path", path.display())))?;
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        AsyncStorageManager::new(dir).load_file(file_name).await
    }

    pub fn validate(&self) -> Result<ResolvedConfig> {
        if self.api_keys.is_empty() {
            return Err(AppError::Config("api_keys must not be empty".to_string()));
        }

        if self.reports.retry_secs == 0 {
            return Err(AppError::Config("reports.retry_secs must be at least 1".to_string()));
        }

        let mut currencies: Vec<String> = Vec::with_capacity(self.currencies.len());
        for currency in &self.currencies {
            if !currencies.contains(currency) {
                currencies.push(currency.clone());
            }
        }

        let mut intervals = Vec::new();
        for name in &self.intervals {
            let interval: IntervalClass = name.parse()?;
            if !intervals.contains(&interval) {
                intervals.push(interval);
            }
        }
        if intervals.is_empty() {
            return Err(AppError::Config("no intervals configured".to_string()));
        }

        let catalog = match &self.patterns {
            Some(ids) => PatternCatalog::builtin().select(ids)?,
            None => PatternCatalog::builtin(),
        };

        Ok(ResolvedConfig {
            currencies,
            intervals,
            catalog,
        })
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_intervals() -> Vec<String> {
    IntervalClass::ALL.iter().map(|i| i.name().to_string()).collect()
}

fn default_base_url() -> String {
    DEFAULT_TIMESERIES_URL.to_string()
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_true() -> bool {
    true
}

fn default_retry_secs() -> u64 {
    60
}

// STORAGE MANAGER

pub struct AsyncStorageManager {
    pub base_dir: PathBuf,
}

impl AsyncStorageManager {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Resolves `relative_path` against the directory of the running executable.
    pub fn new_relative<P: AsRef<Path>>(relative_path: P) -> Result<Self> {
        let exe_path = std::env::current_exe()?;
        let base_dir = exe_path
            .parent()
            .ok_or_else(|| AppError::Config("could not find binary directory".to_string()))?
            .join(relative_path);
        Ok(Self { base_dir })
    }

    /// Reads `<filename>.json`.
    pub async fn load<T: DeserializeOwned>(&self, filename: &str) -> Result<T> {
        self.load_file(&format!("{}.json", filename)).await
    }

    pub async fn load_file<T: DeserializeOwned>(&self, file_name: &str) -> Result<T> {
        let path = self.base_dir.join(file_name);
        // Bytes, not a String: serde_json validates UTF-8 while parsing anyway.
        let content = fs::read(&path).await.map_err(|e| {
            AppError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let data = serde_json::from_slice(&content)?;
        Ok(data)
    }
}
