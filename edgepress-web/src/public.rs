//! Unauthenticated endpoints: health and the published blog

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Article, ArticlePage, ListQuery};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub locale: Option<String>,
    pub page: Option<usize>,
    #[serde(alias = "pageSize", alias = "per_page")]
    pub per_page: Option<usize>,
}

impl PageParams {
    /// Turn query parameters into a store query, checking the locale.
    pub fn into_query(self, state: &AppState, published_only: bool) -> Result<ListQuery, ApiError> {
        let locale = match self.locale.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            Some(code) => Some(
                state
                    .registry
                    .get(code)
                    .map(|l| l.code.clone())
                    .ok_or_else(|| ApiError::BadRequest(format!("unsupported locale: {code}")))?,
            ),
            None => None,
        };
        Ok(ListQuery {
            locale,
            published_only,
            page: self.page.unwrap_or(1),
            per_page: self.per_page.unwrap_or(0),
        })
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_blogs(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<ArticlePage>, ApiError> {
    let query = params.into_query(&state, true)?;
    Ok(Json(state.articles.list(&query).await?))
}

pub async fn get_blog(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Article>, ApiError> {
    let article = state.articles.get(&slug).await?;
    if !article.is_published() {
        return Err(ApiError::NotFound(format!("article not found: {slug}")));
    }
    Ok(Json(article))
}
