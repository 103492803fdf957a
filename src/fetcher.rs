use crate::error::{AppError, Result};
use crate::models::{Credential, IntervalClass, RequestWindow};
use crate::scheduler::Shutdown;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{Instrument, Span, debug, error, info, warn};

pub const DEFAULT_TIMESERIES_URL: &str = "https://marketdata.tradermade.com/api/v1/timeseries";

/// Everything needed to ask the provider for one currency's series.
#[derive(Debug, Clone)]
pub struct QuoteRequest<'a> {
    pub currency: &'a str,
    pub api_key: &'a str,
    pub interval: IntervalClass,
    pub window: &'a RequestWindow,
}

impl QuoteRequest<'_> {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("currency", self.currency.to_string()),
            ("api_key", self.api_key.to_string()),
            ("start_date", self.window.start.clone()),
            ("end_date", self.window.end.clone()),
            ("format", "records".to_string()),
            ("interval", self.interval.name().to_string()),
            ("period", "1".to_string()),
        ]
    }
}

/// Network seam: one call per (currency, credential, window).
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch(&self, request: &QuoteRequest<'_>) -> Result<Value>;
}

pub struct HttpQuoteSource {
    client: Client,
    url: String,
}

impl HttpQuoteSource {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(50)
            .build()
            .map_err(|e| AppError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    async fn fetch(&self, request: &QuoteRequest<'_>) -> Result<Value> {
        let fetch_err = |reason: String| AppError::Fetch {
            currency: request.currency.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&self.url)
            .query(&request.query())
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = response.status();
        info!(
            currency = request.currency,
            status = status.as_u16(),
            "Provider responded"
        );

        if matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
        ) {
            return Err(AppError::CredentialRejected {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP {status}")));
        }

        let body: Value = response.json().await.map_err(|e| fetch_err(e.to_string()))?;
        debug!(currency = request.currency, %body, "Provider payload");
        Ok(body)
    }
}

/// What to do with the rest of a credential's queue after a failed request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Skip only the failing currency.
    #[default]
    Isolate,
    /// Move the remaining currencies on to the next credential.
    AbandonCredential,
}

#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Successfully fetched payloads; a missing currency means "no data this cycle".
    pub payloads: HashMap<String, Value>,
    /// Currencies that were dequeued but produced no payload.
    pub failed: Vec<String>,
    /// Currencies never attempted, because of shutdown or exhausted credentials.
    pub skipped: Vec<String>,
    pub cancelled: bool,
}

pub struct DataFetcher {
    source: Arc<dyn QuoteSource>,
    credentials: Arc<[Credential]>,
    policy: FailurePolicy,
    span: Span,
}

impl DataFetcher {
    pub fn new(
        source: Arc<dyn QuoteSource>,
        credentials: Arc<[Credential]>,
        policy: FailurePolicy,
        span: Span,
    ) -> Result<Self> {
        if credentials.is_empty() {
            return Err(AppError::Config("no API keys configured".to_string()));
        }
        Ok(Self {
            source,
            credentials,
            policy,
            span,
        })
    }

    /// Fetches every currency at most once, walking the credentials in order.
    pub async fn fetch(
        &self,
        interval: IntervalClass,
        currencies: &[String],
        now: DateTime<Utc>,
        shutdown: &Shutdown,
    ) -> FetchOutcome {
        self.drain(interval, currencies, now, shutdown)
            .instrument(self.span.clone())
            .await
    }

    async fn drain(
        &self,
        interval: IntervalClass,
        currencies: &[String],
        now: DateTime<Utc>,
        shutdown: &Shutdown,
    ) -> FetchOutcome {
        let window = interval.request_window(now);
        debug!(start = %window.start, end = %window.end, "Request window");

        let mut queue: VecDeque<String> = currencies.iter().cloned().collect();
        let mut outcome = FetchOutcome::default();

        'credentials: for (key_index, api_key) in self.credentials.iter().enumerate() {
            while let Some(currency) = queue.pop_front() {
                if shutdown.is_triggered() {
                    queue.push_front(currency);
                    outcome.cancelled = true;
                    break 'credentials;
                }

                let request = QuoteRequest {
                    currency: &currency,
                    api_key,
                    interval,
                    window: &window,
                };

                let result = self.source.fetch(&request).await;
                match result {
                    Ok(payload) => {
                        info!(currency = %currency, key_index, "Fetched series");
                        outcome.payloads.insert(currency, payload);
                    }
                    Err(AppError::CredentialRejected { status }) => {
                        warn!(currency = %currency, key_index, status, "Credential rejected, rotating");
                        outcome.failed.push(currency);
                        continue 'credentials;
                    }
                    Err(e) => {
                        error!(currency = %currency, key_index, error = %e, "Fetch failed");
                        outcome.failed.push(currency);
                        if self.policy == FailurePolicy::AbandonCredential {
                            continue 'credentials;
                        }
                    }
                }
            }
            break;
        }

        if !queue.is_empty() {
            if !outcome.cancelled {
                warn!(remaining = queue.len(), "Credentials exhausted before every currency was fetched");
            }
            outcome.skipped.extend(queue);
        }
        outcome
    }
}
