use crate::error::{AppError, Result};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

// --- Provider payload ---

#[derive(Deserialize, Debug)]
struct InputQuote {
    #[serde(default)]
    date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_f64_lenient")]
    open: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_f64_lenient")]
    high: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_f64_lenient")]
    low: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_f64_lenient")]
    close: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct InputPayload {
    quotes: Option<Vec<InputQuote>>,
    message: Option<String>,
}

struct LenientF64Visitor;

impl<'de> Visitor<'de> for LenientF64Visitor {
    type Value = Option<f64>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a float, an integer, or a string representing a number")
    }

    fn visit_f64<E>(self, v: f64) -> std::result::Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        if v.trim().is_empty() {
            Ok(None)
        } else {
            v.trim().parse::<f64>().map(Some).map_err(E::custom)
        }
    }

    fn visit_unit<E>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }
}

fn deserialize_f64_lenient<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientF64Visitor)
}

// --- Domain types ---

/// One observation of the series.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Bars in provider order (ascending by date).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeries {
    pub bars: Vec<Bar>,
}

impl RawSeries {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars }
    }

    /// Validates a provider JSON body. Any quote missing one of
    /// date/open/high/low/close, or a body without `quotes`, is an input error.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let parsed = InputPayload::deserialize(payload)
            .map_err(|e| AppError::input(format!("undecodable payload: {e}")))?;

        let quotes = match parsed.quotes {
            Some(quotes) => quotes,
            None => {
                let reason = match parsed.message {
                    Some(msg) => format!("no 'quotes' in payload (provider said: {msg})"),
                    None => "no 'quotes' in payload".to_string(),
                };
                return Err(AppError::input(reason));
            }
        };

        let bars = quotes
            .into_iter()
            .enumerate()
            .map(|(i, q)| -> Result<Bar> {
                let missing = |field: &str| AppError::input(format!("quotes[{i}] is missing '{field}'"));
                Ok(Bar {
                    date: q.date.ok_or_else(|| missing("date"))?,
                    open: q.open.ok_or_else(|| missing("open"))?,
                    high: q.high.ok_or_else(|| missing("high"))?,
                    low: q.low.ok_or_else(|| missing("low"))?,
                    close: q.close.ok_or_else(|| missing("close"))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Splits the bars into aligned open/high/low/close columns.
    pub fn columns(&self) -> OhlcColumns {
        let n = self.bars.len();
        let mut cols = OhlcColumns {
            open: Vec::with_capacity(n),
            high: Vec::with_capacity(n),
            low: Vec::with_capacity(n),
            close: Vec::with_capacity(n),
        };
        for bar in &self.bars {
            cols.open.push(bar.open);
            cols.high.push(bar.high);
            cols.low.push(bar.low);
            cols.close.push(bar.close);
        }
        cols
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcColumns {
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let payload = json!({
            "quotes": [
                { "date": "2024-03-01", "open": 1.08, "high": "1.09", "low": 1, "close": " 1.085 " },
            ]
        });
        let series = RawSeries::from_payload(&payload).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.bars[0].high, 1.09);
        assert_eq!(series.bars[0].low, 1.0);
        assert_eq!(series.bars[0].close, 1.085);
    }

    #[test]
    fn missing_field_names_the_quote() {
        let payload = json!({
            "quotes": [
                { "date": "2024-03-01", "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0 },
                { "date": "2024-03-02", "open": 1.0, "high": 1.0, "low": 1.0 },
            ]
        });
        let err = RawSeries::from_payload(&payload).unwrap_err();
        assert!(err.to_string().contains("quotes[1] is missing 'close'"));
    }

    #[test]
    fn null_price_counts_as_missing() {
        let payload = json!({
            "quotes": [{ "date": "2024-03-01", "open": null, "high": 1.0, "low": 1.0, "close": 1.0 }]
        });
        assert!(RawSeries::from_payload(&payload).is_err());
    }

    #[test]
    fn provider_error_body_is_reported() {
        let payload = json!({ "error": 401, "message": "Invalid API Key" });
        let err = RawSeries::from_payload(&payload).unwrap_err();
        assert!(err.to_string().contains("Invalid API Key"));
    }

    #[test]
    fn empty_quotes_is_a_valid_empty_series() {
        let series = RawSeries::from_payload(&json!({ "quotes": [] })).unwrap();
        assert!(series.is_empty());
        assert!(series.columns().close.is_empty());
    }
}
