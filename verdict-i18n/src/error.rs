//! Error types for i18n operations

use thiserror::Error;

/// Errors raised while parsing locales or loading message bundles.
#[derive(Debug, Error)]
pub enum I18nError {
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),

    #[error("Failed to parse message file: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}
