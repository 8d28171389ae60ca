//! Multi-language translation of message trees
//!
//! A [`Translator`] takes one English sub-tree and a set of target locales and
//! returns a partial tree per locale. The production implementation,
//! [`PromptTranslator`], asks a text model for all languages in a single call
//! and expects back
//!
//! ```json
//! { "fr": { ...same shape as the source... }, "de": { ... } }
//! ```
//!
//! Locales the model leaves out are simply absent from the bundle; the
//! reconciler records them as failed.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use edgepress_i18n::{Locale, Messages};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::client::{AiClient, TextParams};
use crate::config::{DEFAULT_MAX_TOKENS, DEFAULT_TEXT_MODEL};
use crate::error::{AiError, AiResult};
use crate::extract::parse_json_object;

/// Locale code to translated partial tree
pub type TranslatedBundle = HashMap<String, Messages>;

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate every leaf of `source` into each of `targets`.
    async fn translate(&self, source: &Messages, targets: &[Locale]) -> AiResult<TranslatedBundle>;

    fn provider_name(&self) -> &str;
}

/// [`Translator`] backed by a single prompt per call to a text model.
#[derive(Clone)]
pub struct PromptTranslator {
    client: Arc<dyn AiClient>,
    model: String,
    max_tokens: u32,
}

impl PromptTranslator {
    pub fn new(client: Arc<dyn AiClient>) -> Self {
        Self {
            client,
            model: DEFAULT_TEXT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl std::fmt::Debug for PromptTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptTranslator")
            .field("provider", &self.client.provider_name())
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Build the translation prompt for one batch.
pub fn build_translation_prompt(source: &Messages, targets: &[Locale]) -> AiResult<String> {
    let language_list = targets
        .iter()
        .map(|l| format!("{}: {}", l.code, l.name))
        .collect::<Vec<_>>()
        .join(", ");
    let compact = serde_json::to_string(source)
        .map_err(|e| AiError::Validation(format!("cannot serialize source messages: {e}")))?;
    let example = targets
        .iter()
        .take(2)
        .map(|l| format!("  \"{}\": {{ /* {} translation */ }}", l.code, l.name))
        .collect::<Vec<_>>()
        .join(",\n");

    Ok(format!(
        "I need to translate a JSON structure from English to multiple languages: {language_list}.

The JSON structure contains messages for an application. Please translate all text values (not the keys) to each target language.

Rules:
1. Preserve all placeholders like {{name}}, {{count}}, etc.
2. Maintain the exact same JSON structure for each language
3. Return a single JSON object with language codes as top-level keys

Source JSON (English):
{compact}

Please respond with a JSON object where each top-level key is a language code, and the value is the translated JSON structure:
{{
{example}
}}

Return only the JSON without any additional text or explanations."
    ))
}

/// Check the model's object against the requested locales.
///
/// Top-level keys are matched to locale codes case-insensitively. Entries
/// that are not objects, or that name a locale nobody asked for, are dropped
/// with a warning.
pub fn bundle_from_response(
    response: serde_json::Map<String, Value>,
    targets: &[Locale],
) -> TranslatedBundle {
    let mut bundle = TranslatedBundle::new();
    for (code, value) in response {
        let Some(locale) = targets.iter().find(|l| l.code.eq_ignore_ascii_case(&code)) else {
            tracing::warn!(locale = %code, "ignoring translation for unrequested locale");
            continue;
        };
        match value {
            Value::Object(tree) => {
                bundle.insert(locale.code.clone(), tree);
            }
            other => {
                tracing::warn!(
                    locale = %locale.code,
                    kind = json_kind(&other),
                    "translation is not an object, dropping"
                );
            }
        }
    }
    bundle
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\s*([A-Za-z0-9_]+)").expect("valid placeholder pattern"));

/// ICU-style placeholder names in a message (`{name}`, `{count, plural, ...}`).
pub fn placeholders(text: &str) -> BTreeSet<String> {
    PLACEHOLDER_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Dot-paths whose placeholder set differs between source and translation.
pub fn placeholder_drift(source: &Messages, translated: &Messages) -> Vec<String> {
    let mut drifted = Vec::new();
    for path in edgepress_i18n::leaf_keys(translated) {
        let (Some(Value::String(original)), Some(Value::String(text))) = (
            edgepress_i18n::get_path(source, &path),
            edgepress_i18n::get_path(translated, &path),
        ) else {
            continue;
        };
        if placeholders(original) != placeholders(text) {
            drifted.push(path);
        }
    }
    drifted
}

#[async_trait]
impl Translator for PromptTranslator {
    async fn translate(&self, source: &Messages, targets: &[Locale]) -> AiResult<TranslatedBundle> {
        if targets.is_empty() || source.is_empty() {
            return Ok(TranslatedBundle::new());
        }

        let prompt = build_translation_prompt(source, targets)?;
        tracing::debug!(
            locales = targets.len(),
            prompt_len = prompt.len(),
            "requesting translation"
        );

        let text = self
            .client
            .run_text(&self.model, &TextParams::new(prompt, self.max_tokens))
            .await?;
        let response = parse_json_object(&text)?;
        let bundle = bundle_from_response(response, targets);

        for (code, tree) in &bundle {
            let drifted = placeholder_drift(source, tree);
            if !drifted.is_empty() {
                tracing::warn!(locale = %code, keys = ?drifted, "placeholders changed in translation");
            }
        }

        Ok(bundle)
    }

    fn provider_name(&self) -> &str {
        self.client.provider_name()
    }
}
