//! Cloudflare Workers AI client
//!
//! Calls `POST {base_url}/accounts/{account_id}/ai/run/{model}` with bearer
//! authentication. Every response is wrapped in the standard Cloudflare
//! envelope:
//!
//! ```json
//! { "success": true, "errors": [], "result": { "response": "..." } }
//! ```
//!
//! Text models put their output in `result.response`; image models return a
//! base64 PNG in `result.image`.
//!
//! # Example
//!
//! ```ignore
//! use edgepress_ai::{AiClient, AiConfig, TextParams, WorkersAiClient};
//!
//! let client = WorkersAiClient::new(AiConfig::from_env()?)?;
//! let text = client
//!     .run_text("@cf/meta/llama-4-scout-17b-16e-instruct", &TextParams::new("Hello", 256))
//!     .await?;
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::client::{AiClient, ImageParams, TextParams};
use crate::config::AiConfig;
use crate::error::{AiError, AiResult};

#[derive(Clone)]
pub struct WorkersAiClient {
    config: AiConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    errors: Vec<EnvelopeError>,
    #[serde(default)]
    result: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

fn default_success() -> bool {
    true
}

impl WorkersAiClient {
    /// Create a client from validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - New client instance
    /// * `Err(AiError)` - If the configuration is incomplete or the HTTP
    ///   client cannot be built
    pub fn new(config: AiConfig) -> AiResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Create a client from `CLOUDFLARE_ACCOUNT_ID` and `CLOUDFLARE_API_TOKEN`.
    pub fn from_env() -> AiResult<Self> {
        Self::new(AiConfig::from_env()?)
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/accounts/{}/ai/run/{}",
            self.config.base_url, self.config.account_id, model
        )
    }

    async fn post(&self, model: &str, body: &impl serde::Serialize) -> AiResult<Value> {
        if model.trim().is_empty() {
            return Err(AiError::Validation("model cannot be empty".to_string()));
        }

        let response = self
            .client
            .post(self.endpoint(model))
            .bearer_auth(&self.config.api_token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AiError::Api {
                status: status.as_u16(),
                message: envelope_error_message(&body).unwrap_or(body),
            });
        }

        unwrap_envelope(&body)
    }
}

/// Extract the `result` member of a successful envelope.
fn unwrap_envelope(body: &str) -> AiResult<Value> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| AiError::Response(format!("failed to parse API response: {e}")))?;

    if !envelope.success {
        let message = join_errors(&envelope.errors);
        return Err(AiError::Api {
            status: 200,
            message: if message.is_empty() {
                "request was not successful".to_string()
            } else {
                message
            },
        });
    }

    envelope
        .result
        .ok_or_else(|| AiError::Response("missing 'result' in API response".to_string()))
}

fn envelope_error_message(body: &str) -> Option<String> {
    let envelope: Envelope = serde_json::from_str(body).ok()?;
    let message = join_errors(&envelope.errors);
    (!message.is_empty()).then_some(message)
}

fn join_errors(errors: &[EnvelopeError]) -> String {
    errors
        .iter()
        .map(|e| match e.code {
            Some(code) => format!("{code}: {}", e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Text output from a `result` value. Some models return structured JSON in
/// `response` instead of a string; it is re-serialized so callers can run
/// the usual extraction over it.
fn text_from_result(result: &Value) -> AiResult<String> {
    match result.get("response") {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Null) | None => Err(AiError::Response(
            "missing 'result.response' in API response".to_string(),
        )),
        Some(other) => Ok(other.to_string()),
    }
}

fn image_from_result(result: &Value) -> AiResult<String> {
    result
        .get("image")
        .and_then(Value::as_str)
        .filter(|image| !image.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AiError::Response("missing 'result.image' in API response".to_string()))
}

impl std::fmt::Debug for WorkersAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkersAiClient")
            .field("account_id", &self.config.account_id)
            .field("api_token", &"***")
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

#[async_trait]
impl AiClient for WorkersAiClient {
    async fn run_text(&self, model: &str, params: &TextParams) -> AiResult<String> {
        tracing::debug!(model, prompt_len = params.prompt.len(), "running text model");
        let result = self.post(model, params).await?;
        text_from_result(&result)
    }

    async fn run_image(&self, model: &str, params: &ImageParams) -> AiResult<String> {
        tracing::debug!(model, params.width, params.height, params.steps, "running image model");
        let result = self.post(model, params).await?;
        image_from_result(&result)
    }

    fn provider_name(&self) -> &str {
        "Workers AI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_with_valid_config() {
        let client = WorkersAiClient::new(AiConfig::new("acct", "token")).unwrap();
        assert_eq!(client.provider_name(), "Workers AI");
        assert_eq!(
            client.endpoint("@cf/meta/llama-4-scout-17b-16e-instruct"),
            "https://api.cloudflare.com/client/v4/accounts/acct/ai/run/@cf/meta/llama-4-scout-17b-16e-instruct"
        );
    }

    #[test]
    fn test_new_with_empty_token() {
        match WorkersAiClient::new(AiConfig::new("acct", "")) {
            Err(AiError::Config(msg)) => assert!(msg.contains("empty")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_debug_masks_token() {
        let client = WorkersAiClient::new(AiConfig::new("acct", "very-secret")).unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("***"));
        assert!(!debug.contains("very-secret"));
    }

    #[test]
    fn test_unwrap_text_envelope() {
        let body = r#"{"success":true,"errors":[],"result":{"response":"{\"fr\":{}}"}}"#;
        let result = unwrap_envelope(body).unwrap();
        assert_eq!(text_from_result(&result).unwrap(), r#"{"fr":{}}"#);
    }

    #[test]
    fn test_structured_response_is_stringified() {
        let result = json!({ "response": { "fr": { "title": "Bonjour" } } });
        let text = text_from_result(&result).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&text).unwrap(),
            json!({ "fr": { "title": "Bonjour" } })
        );
    }

    #[test]
    fn test_missing_response() {
        assert!(matches!(
            text_from_result(&json!({})),
            Err(AiError::Response(_))
        ));
    }

    #[test]
    fn test_unsuccessful_envelope() {
        let body = r#"{"success":false,"errors":[{"code":7003,"message":"No route"}],"result":null}"#;
        match unwrap_envelope(body) {
            Err(AiError::Api { message, .. }) => assert_eq!(message, "7003: No route"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_message_from_failed_status_body() {
        let body = r#"{"success":false,"errors":[{"message":"Authentication error"}]}"#;
        assert_eq!(
            envelope_error_message(body).as_deref(),
            Some("Authentication error")
        );
        assert_eq!(envelope_error_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn test_image_result() {
        assert_eq!(
            image_from_result(&json!({ "image": "iVBORw0KGgo=" })).unwrap(),
            "iVBORw0KGgo="
        );
        assert!(image_from_result(&json!({ "image": "" })).is_err());
    }

    #[test]
    fn test_non_json_body() {
        assert!(matches!(
            unwrap_envelope("upstream timeout"),
            Err(AiError::Response(_))
        ));
    }

    // Real API tests (require CLOUDFLARE_ACCOUNT_ID and CLOUDFLARE_API_TOKEN)

    #[tokio::test]
    #[ignore]
    async fn test_real_text_generation() {
        let client = WorkersAiClient::from_env().expect("credentials not set");
        let model = client.config().text_model.clone();
        let text = client
            .run_text(&model, &TextParams::new("Reply with the word ok.", 16))
            .await
            .unwrap();
        assert!(!text.is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_real_image_generation() {
        let client = WorkersAiClient::from_env().expect("credentials not set");
        let model = client.config().image_model.clone();
        let params = ImageParams {
            prompt: "a lighthouse at dusk".to_string(),
            negative_prompt: None,
            width: 512,
            height: 512,
            steps: 4,
            seed: Some(1),
        };
        let image = client.run_image(&model, &params).await.unwrap();
        assert!(!image.is_empty());
    }
}
