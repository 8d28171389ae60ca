//! Article generation from keywords
//!
//! One keyword becomes one prompt; the model answers with a JSON object
//! holding the title, slug, excerpt and markdown body. Batch generation runs
//! keywords in parallel chunks (8 by default), finishing a chunk before the
//! next one starts, and reports every keyword as either a success or an
//! error.

use std::num::NonZeroUsize;
use std::sync::Arc;

use edgepress_i18n::{CANONICAL_LOCALE, LocaleRegistry};
use serde::{Deserialize, Serialize};

use crate::client::{AiClient, TextParams};
use crate::config::{DEFAULT_MAX_TOKENS, DEFAULT_TEXT_MODEL};
use crate::error::{AiError, AiResult};
use crate::extract::parse_json_object;
use crate::scheduler::{ChunkMode, ChunkedScheduler};

pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(8) {
    Some(size) => size,
    None => NonZeroUsize::MIN,
};

const EXCERPT_CHARS: usize = 160;

/// An article candidate; nothing is persisted until an editor saves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArticle {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub locale: String,
}

/// What the model is asked to return
#[derive(Debug, Deserialize)]
struct ArticlePayload {
    title: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    excerpt: Option<String>,
    content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum KeywordStatus {
    Success { article: GeneratedArticle },
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordOutcome {
    pub keyword: String,
    #[serde(flatten)]
    pub status: KeywordStatus,
}

impl KeywordOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, KeywordStatus::Success { .. })
    }

    pub fn article(&self) -> Option<&GeneratedArticle> {
        match &self.status {
            KeywordStatus::Success { article } => Some(article),
            KeywordStatus::Error { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchArticleReport {
    /// One entry per keyword, in the order keywords were given
    pub results: Vec<KeywordOutcome>,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct ArticleGenerator {
    client: Arc<dyn AiClient>,
    registry: LocaleRegistry,
    model: String,
    max_tokens: u32,
    chunk_size: NonZeroUsize,
}

impl ArticleGenerator {
    pub fn new(client: Arc<dyn AiClient>, registry: LocaleRegistry) -> Self {
        Self {
            client,
            registry,
            model: DEFAULT_TEXT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: NonZeroUsize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Resolve an optional locale to a registered code, defaulting to English.
    fn resolve_locale(&self, locale: Option<&str>) -> AiResult<String> {
        let code = locale
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .unwrap_or(CANONICAL_LOCALE);
        self.registry
            .get(code)
            .map(|l| l.code.clone())
            .ok_or_else(|| AiError::Validation(format!("unsupported locale: {code}")))
    }

    /// Generate one article for `keyword`.
    pub async fn generate(&self, keyword: &str, locale: Option<&str>) -> AiResult<GeneratedArticle> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(AiError::Validation("keyword is required".to_string()));
        }
        let locale = self.resolve_locale(locale)?;
        self.generate_resolved(keyword, &locale).await
    }

    async fn generate_resolved(&self, keyword: &str, locale: &str) -> AiResult<GeneratedArticle> {
        let language = self
            .registry
            .get(locale)
            .map(|l| l.name.as_str())
            .unwrap_or(locale);
        let prompt = build_article_prompt(keyword, language);

        let text = self
            .client
            .run_text(&self.model, &TextParams::new(prompt, self.max_tokens))
            .await?;
        let article = article_from_response(&text, locale)?;
        tracing::debug!(keyword, slug = %article.slug, "article generated");
        Ok(article)
    }

    /// Generate articles for many keywords.
    ///
    /// Blank keywords are dropped; if none remain the call fails before any
    /// remote request. Per-keyword failures are reported, never raised.
    pub async fn generate_batch(
        &self,
        keywords: &[String],
        locale: Option<&str>,
    ) -> AiResult<BatchArticleReport> {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        if keywords.is_empty() {
            return Err(AiError::Validation("no valid keywords".to_string()));
        }
        let locale = self.resolve_locale(locale)?;

        tracing::info!(
            keywords = keywords.len(),
            chunk_size = self.chunk_size.get(),
            locale = %locale,
            "generating articles"
        );

        let scheduler = ChunkedScheduler::new(self.chunk_size, ChunkMode::Parallel);
        let results = scheduler
            .run(keywords, |keyword| {
                let locale = &locale;
                async move {
                    let status = match self.generate_resolved(&keyword, locale).await {
                        Ok(article) => KeywordStatus::Success { article },
                        Err(e) => {
                            tracing::warn!(keyword = %keyword, error = %e, "article generation failed");
                            KeywordStatus::Error {
                                error: e.to_string(),
                            }
                        }
                    };
                    KeywordOutcome { keyword, status }
                }
            })
            .await;

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - succeeded;
        tracing::info!(succeeded, failed, "article batch finished");

        Ok(BatchArticleReport {
            results,
            succeeded,
            failed,
        })
    }
}

impl std::fmt::Debug for ArticleGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArticleGenerator")
            .field("provider", &self.client.provider_name())
            .field("model", &self.model)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

pub fn build_article_prompt(keyword: &str, language: &str) -> String {
    format!(
        "Write an original, well-structured blog article about \"{keyword}\" in {language}.

Respond with a single JSON object and nothing else:
{{
  \"title\": \"engaging article title\",
  \"slug\": \"url-friendly-slug-in-lowercase-ascii\",
  \"excerpt\": \"one or two sentence summary\",
  \"content\": \"full article body in Markdown with ## headings\"
}}

The content should be at least 800 words. Escape newlines inside JSON strings."
    )
}

/// Turn raw model output into a validated article.
pub fn article_from_response(text: &str, locale: &str) -> AiResult<GeneratedArticle> {
    let object = parse_json_object(text)?;
    let payload: ArticlePayload = serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|e| AiError::Response(format!("article is missing fields: {e}")))?;

    let title = payload.title.trim().to_string();
    let content = payload.content.trim().to_string();
    if title.is_empty() {
        return Err(AiError::Response("article title is empty".to_string()));
    }
    if content.is_empty() {
        return Err(AiError::Response("article content is empty".to_string()));
    }

    let slug = payload
        .slug
        .as_deref()
        .map(slug::slugify)
        .filter(|s| !s.is_empty())
        .or_else(|| Some(slug::slugify(&title)).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let excerpt = payload
        .excerpt
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| excerpt_from(&content));

    Ok(GeneratedArticle {
        title,
        slug,
        excerpt,
        content,
        locale: locale.to_string(),
    })
}

/// First paragraph of markdown as plain text, cut at a char boundary.
fn excerpt_from(content: &str) -> String {
    let paragraph = content
        .split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty() && !p.starts_with('#'))
        .unwrap_or("");
    let plain: String = paragraph
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '`' | '#'))
        .collect();
    if plain.chars().count() <= EXCERPT_CHARS {
        return plain;
    }
    let cut: String = plain.chars().take(EXCERPT_CHARS).collect();
    format!("{}…", cut.trim_end())
}
