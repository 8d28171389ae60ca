//! Remote inference seam
//!
//! Everything that needs a model goes through [`AiClient`]. The production
//! implementation talks to Workers AI over HTTP; tests and `--mock` runs use
//! [`crate::mock::MockAiClient`].

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AiResult;

/// Parameters for a text generation call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextParams {
    pub prompt: String,
    pub max_tokens: u32,
    pub stream: bool,
}

impl TextParams {
    pub fn new(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
            stream: false,
        }
    }
}

/// Parameters for a text-to-image call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageParams {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// A remote model host
///
/// Implementations report transport and API failures as errors; callers
/// decide whether a failure aborts anything.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Run a text model and return its raw text output.
    async fn run_text(&self, model: &str, params: &TextParams) -> AiResult<String>;

    /// Run an image model and return the image as base64 (optionally already
    /// a `data:` URL).
    async fn run_image(&self, model: &str, params: &ImageParams) -> AiResult<String>;

    /// Name used in logs.
    fn provider_name(&self) -> &str;
}
