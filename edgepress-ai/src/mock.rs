//! Deterministic, network-free providers
//!
//! [`MockTranslator`] stands in for a whole [`Translator`] and is what the
//! reconciliation tests and `edgepress-translate --mock` use.
//! [`MockAiClient`] sits one level lower and answers raw prompts, for code
//! that builds its own prompts (articles, images, [`crate::PromptTranslator`]).
//!
//! # Example
//!
//! ```ignore
//! use edgepress_ai::{MockMode, MockTranslator, Translator};
//!
//! let mock = MockTranslator::new(MockMode::Suffix);
//! let bundle = mock.translate(&source, &[fr]).await?;
//! // {"title": "Hello"} -> {"fr": {"title": "Hello_fr"}}
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use edgepress_i18n::{Locale, Messages};
use serde_json::Value;

use crate::client::{AiClient, ImageParams, TextParams};
use crate::error::{AiError, AiResult};
use crate::translator::{TranslatedBundle, Translator};

/// Mock translation behaviours
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockMode {
    /// Append the locale code to every string leaf: "Hello" -> "Hello_fr"
    Suffix,
    /// Return the source tree unchanged for every locale
    NoOp,
    /// Fail every call with an API error carrying this message
    Error(String),
    /// Like `Suffix`, but leave this locale out of the response
    Omit(String),
}

/// One recorded `translate` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorCall {
    pub keys: Vec<String>,
    pub locales: Vec<String>,
}

#[derive(Debug)]
pub struct MockTranslator {
    mode: MockMode,
    delay: Duration,
    /// Zero-based call indices that fail regardless of mode
    failing_calls: HashSet<usize>,
    counter: AtomicUsize,
    calls: Mutex<Vec<TranslatorCall>>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay: Duration::ZERO,
            failing_calls: HashSet::new(),
            counter: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Simulate network latency on every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make the given zero-based calls fail.
    pub fn failing_on(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.failing_calls.extend(calls);
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<TranslatorCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, source: &Messages, targets: &[Locale]) -> usize {
        let call = TranslatorCall {
            keys: edgepress_i18n::leaf_keys(source),
            locales: targets.iter().map(|l| l.code.clone()).collect(),
        };
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        self.counter.fetch_add(1, Ordering::SeqCst)
    }
}

fn suffix_leaves(tree: &Messages, code: &str) -> Messages {
    tree.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Object(child) => Value::Object(suffix_leaves(child, code)),
                Value::String(text) => Value::String(format!("{text}_{code}")),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, source: &Messages, targets: &[Locale]) -> AiResult<TranslatedBundle> {
        let call = self.record(source, targets);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.failing_calls.contains(&call) {
            return Err(AiError::Api {
                status: 500,
                message: format!("mock failure on call {call}"),
            });
        }

        let mut bundle = HashMap::new();
        for locale in targets {
            let tree = match &self.mode {
                MockMode::Error(message) => {
                    return Err(AiError::Api {
                        status: 500,
                        message: message.clone(),
                    });
                }
                MockMode::NoOp => source.clone(),
                MockMode::Omit(code) if code.eq_ignore_ascii_case(&locale.code) => continue,
                MockMode::Suffix | MockMode::Omit(_) => suffix_leaves(source, &locale.code),
            };
            bundle.insert(locale.code.clone(), tree);
        }
        Ok(bundle)
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}

type Responder = Box<dyn Fn(&str) -> AiResult<String> + Send + Sync>;

/// Scripted [`AiClient`]: answers each prompt through a closure and records
/// what it was asked.
pub struct MockAiClient {
    text: Responder,
    image: Responder,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// 1×1 transparent PNG
pub const MOCK_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

impl MockAiClient {
    /// Answer every text prompt with `response`.
    pub fn constant(response: impl Into<String>) -> Self {
        let response = response.into();
        Self::with_text(move |_| Ok(response.clone()))
    }

    pub fn with_text<F>(text: F) -> Self
    where
        F: Fn(&str) -> AiResult<String> + Send + Sync + 'static,
    {
        Self {
            text: Box::new(text),
            image: Box::new(|_| Ok(MOCK_PNG_BASE64.to_string())),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn with_image<F>(mut self, image: F) -> Self
    where
        F: Fn(&str) -> AiResult<String> + Send + Sync + 'static,
    {
        self.image = Box::new(image);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Prompts received so far, text and image, in arrival order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    /// Highest number of calls that were in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn respond(&self, prompt: &str, responder: &Responder) -> AiResult<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = responder(prompt);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl std::fmt::Debug for MockAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockAiClient")
            .field("delay", &self.delay)
            .field("calls", &self.prompts().len())
            .finish()
    }
}

#[async_trait]
impl AiClient for MockAiClient {
    async fn run_text(&self, _model: &str, params: &TextParams) -> AiResult<String> {
        self.respond(&params.prompt, &self.text).await
    }

    async fn run_image(&self, _model: &str, params: &ImageParams) -> AiResult<String> {
        self.respond(&params.prompt, &self.image).await
    }

    fn provider_name(&self) -> &str {
        "Mock AI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> Messages {
        match json!({ "nav": { "home": "Home", "count": 3 }, "title": "Blog" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn locales(codes: &[&str]) -> Vec<Locale> {
        codes.iter().map(|c| Locale::new(*c, *c)).collect()
    }

    #[tokio::test]
    async fn test_suffix_mode() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let bundle = mock.translate(&source(), &locales(&["fr", "de"])).await.unwrap();

        assert_eq!(
            Value::Object(bundle["fr"].clone()),
            json!({ "nav": { "home": "Home_fr", "count": 3 }, "title": "Blog_fr" })
        );
        assert_eq!(bundle["de"]["title"], json!("Blog_de"));
    }

    #[tokio::test]
    async fn test_noop_mode() {
        let mock = MockTranslator::new(MockMode::NoOp);
        let bundle = mock.translate(&source(), &locales(&["ja"])).await.unwrap();
        assert_eq!(bundle["ja"], source());
    }

    #[tokio::test]
    async fn test_error_mode() {
        let mock = MockTranslator::new(MockMode::Error("quota exceeded".to_string()));
        match mock.translate(&source(), &locales(&["fr"])).await {
            Err(AiError::Api { message, .. }) => assert_eq!(message, "quota exceeded"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_omit_mode() {
        let mock = MockTranslator::new(MockMode::Omit("de".to_string()));
        let bundle = mock.translate(&source(), &locales(&["fr", "de"])).await.unwrap();
        assert!(bundle.contains_key("fr"));
        assert!(!bundle.contains_key("de"));
    }

    #[tokio::test]
    async fn test_failing_calls_and_log() {
        let mock = MockTranslator::new(MockMode::Suffix).failing_on([1]);
        let targets = locales(&["fr"]);

        assert!(mock.translate(&source(), &targets).await.is_ok());
        assert!(mock.translate(&source(), &targets).await.is_err());
        assert!(mock.translate(&source(), &targets).await.is_ok());

        let calls = mock.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].keys, vec!["nav.home", "nav.count", "title"]);
        assert_eq!(calls[0].locales, vec!["fr"]);
    }

    #[tokio::test]
    async fn test_mock_ai_client_records_prompts() {
        let client = MockAiClient::with_text(|prompt| Ok(prompt.to_uppercase()));
        let out = client
            .run_text("model", &TextParams::new("hello", 10))
            .await
            .unwrap();
        assert_eq!(out, "HELLO");
        assert_eq!(client.prompts(), vec!["hello"]);
        assert_eq!(client.peak_concurrency(), 1);
    }

    #[tokio::test]
    async fn test_mock_ai_client_default_image() {
        let client = MockAiClient::constant("ignored");
        let params = ImageParams {
            prompt: "cat".to_string(),
            negative_prompt: None,
            width: 1,
            height: 1,
            steps: 1,
            seed: None,
        };
        assert_eq!(client.run_image("m", &params).await.unwrap(), MOCK_PNG_BASE64);
    }
}
