use edgepress_i18n::CatalogError;
use thiserror::Error;

use crate::extract::ExtractError;

/// Error types for remote AI calls and the pipelines built on them
#[derive(Debug, Error)]
pub enum AiError {
    /// Missing or invalid configuration (API token, account id, model)
    #[error("configuration error: {0}")]
    Config(String),
    /// Transport failure before a response was received
    #[error("network error: {0}")]
    Network(String),
    /// The remote service answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    /// The response arrived but did not have the expected shape
    #[error("unexpected response: {0}")]
    Response(String),
    /// No usable JSON could be pulled out of model output
    #[error(transparent)]
    Extract(#[from] ExtractError),
    /// Caller input rejected before any remote call
    #[error("validation error: {0}")]
    Validation(String),
    /// Object storage failure
    #[error("storage error: {0}")]
    Storage(String),
    /// Message catalog failure
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        AiError::Network(e.to_string())
    }
}

/// Result type for AI operations
pub type AiResult<T> = Result<T, AiError>;
