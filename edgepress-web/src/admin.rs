//! Admin endpoints: article CRUD and the AI generation flows
//!
//! Every route here sits behind [`crate::auth::require_admin`].

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use edgepress_ai::{BatchArticleReport, GeneratedArticle, GeneratedImage, ImageRequest, cover_request};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::public::PageParams;
use crate::state::AppState;
use crate::store::{Article, ArticlePage, ArticleUpdate, NewArticle};

fn check_locale(state: &AppState, locale: &str) -> Result<String, ApiError> {
    state
        .registry
        .get(locale)
        .map(|l| l.code.clone())
        .ok_or_else(|| ApiError::BadRequest(format!("unsupported locale: {locale}")))
}

pub async fn list_articles(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<ArticlePage>, ApiError> {
    let query = params.into_query(&state, false)?;
    Ok(Json(state.articles.list(&query).await?))
}

pub async fn create_article(
    State(state): State<AppState>,
    Json(mut article): Json<NewArticle>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    article.locale = check_locale(&state, &article.locale)?;
    let created = state.articles.create(article).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.articles.get(&slug).await?))
}

pub async fn update_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(mut update): Json<ArticleUpdate>,
) -> Result<Json<Article>, ApiError> {
    if let Some(locale) = update.locale.take() {
        update.locale = Some(check_locale(&state, &locale)?);
    }
    Ok(Json(state.articles.update(&slug, update).await?))
}

pub async fn delete_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.articles.delete(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Generate a cover image from the article title and attach it.
pub async fn generate_cover(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Article>, ApiError> {
    let article = state.articles.get(&slug).await?;
    let image = state.images.generate(&cover_request(&article.title)).await?;
    let cover = image.object_key.unwrap_or(image.data_url);

    let update = ArticleUpdate {
        cover_image: Some(cover),
        ..Default::default()
    };
    Ok(Json(state.articles.update(&slug, update).await?))
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

pub async fn generate_article(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GeneratedArticle>, ApiError> {
    let keyword = request
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Keyword is required".to_string()))?;

    let article = state
        .writer
        .generate(keyword, request.locale.as_deref())
        .await?;
    Ok(Json(article))
}

#[derive(Debug, Deserialize)]
pub struct BatchGenerateRequest {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

pub async fn generate_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchGenerateRequest>,
) -> Result<Json<BatchArticleReport>, ApiError> {
    let report = state
        .writer
        .generate_batch(&request.keywords, request.locale.as_deref())
        .await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct SaveBatchRequest {
    pub articles: Vec<GeneratedArticle>,
    #[serde(default)]
    pub publish: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SaveStatus {
    Success { article: Article },
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub slug: String,
    #[serde(flatten)]
    pub status: SaveStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveBatchReport {
    pub results: Vec<SaveOutcome>,
    pub succeeded: usize,
    pub failed: usize,
}

/// Persist generated articles one by one; each gets its own result.
pub async fn save_batch(
    State(state): State<AppState>,
    Json(request): Json<SaveBatchRequest>,
) -> Result<Json<SaveBatchReport>, ApiError> {
    if request.articles.is_empty() {
        return Err(ApiError::BadRequest("no articles to save".to_string()));
    }

    let mut results = Vec::with_capacity(request.articles.len());
    for generated in request.articles {
        let slug = generated.slug.clone();
        let saved = match check_locale(&state, &generated.locale) {
            Ok(locale) => state
                .articles
                .create(NewArticle {
                    title: generated.title,
                    slug: Some(generated.slug),
                    excerpt: generated.excerpt,
                    content: generated.content,
                    cover_image: None,
                    locale,
                    publish: request.publish,
                })
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        let status = match saved {
            Ok(article) => SaveStatus::Success { article },
            Err(error) => {
                tracing::warn!(slug = %slug, error = %error, "failed to save generated article");
                SaveStatus::Error { error }
            }
        };
        results.push(SaveOutcome { slug, status });
    }

    let succeeded = results
        .iter()
        .filter(|r| matches!(r.status, SaveStatus::Success { .. }))
        .count();
    let failed = results.len() - succeeded;
    tracing::info!(succeeded, failed, publish = request.publish, "batch saved");

    Ok(Json(SaveBatchReport {
        results,
        succeeded,
        failed,
    }))
}

pub async fn generate_image(
    State(state): State<AppState>,
    Json(request): Json<ImageRequest>,
) -> Result<Json<GeneratedImage>, ApiError> {
    Ok(Json(state.images.generate(&request).await?))
}
