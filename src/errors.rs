use thiserror::Error;

use crate::number::NumberError;

/// Error type that captures common ledger failures.
#[derive(Debug, Error)]
pub enum CurrencyError {
    #[error(transparent)]
    Number(#[from] NumberError),
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CurrencyError {
    pub(crate) fn unknown(id: &impl std::fmt::Display) -> Self {
        CurrencyError::UnknownCurrency(id.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CurrencyError>;
