use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum AppError {
    /// Unknown interval, empty credential list, unknown pattern id and friends.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch failed for {currency}: {reason}")]
    Fetch { currency: String, reason: String },

    #[error("Credential rejected by provider (HTTP {status})")]
    CredentialRejected { status: u16 },

    #[error("Malformed payload{}: {reason}", .currency.as_deref().map(|c| format!(" for {c}")).unwrap_or_default())]
    Input {
        currency: Option<String>,
        reason: String,
    },

    #[error("Report export to {} failed: {reason}", .path.display())]
    Sink { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn input(reason: impl Into<String>) -> Self {
        AppError::Input {
            currency: None,
            reason: reason.into(),
        }
    }

    /// Attaches the currency to an input error raised before it was known.
    pub fn for_currency(self, currency: &str) -> Self {
        match self {
            AppError::Input { reason, .. } => AppError::Input {
                currency: Some(currency.to_string()),
                reason,
            },
            other => other,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, AppError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_error_mentions_currency_once_attached() {
        let err = AppError::input("quotes[3] is missing 'close'");
        assert_eq!(
            err.to_string(),
            "Malformed payload: quotes[3] is missing 'close'"
        );
        let err = err.for_currency("EURUSD");
        assert_eq!(
            err.to_string(),
            "Malformed payload for EURUSD: quotes[3] is missing 'close'"
        );
    }

    #[test]
    fn only_config_errors_are_config() {
        assert!(AppError::Config("no api keys".into()).is_config());
        assert!(!AppError::CredentialRejected { status: 429 }.is_config());
    }
}
