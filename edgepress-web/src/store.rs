//! Article persistence
//!
//! [`ArticleStore`] is the seam a database-backed store would implement;
//! [`MemoryArticleStore`] keeps everything in process.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: usize = 18;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    /// Markdown body
    pub content: String,
    pub cover_image: Option<String>,
    pub locale: String,
    /// `None` while the article is a draft
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Article {
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }
}

/// Fields supplied when creating an article
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: String,
    pub content: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub locale: String,
    #[serde(default)]
    pub publish: bool,
}

/// Partial update; absent fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub locale: Option<String>,
    pub publish: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub locale: Option<String>,
    pub published_only: bool,
    /// 1-based
    pub page: usize,
    pub per_page: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePage {
    pub items: Vec<Article>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("article not found: {0}")]
    NotFound(String),
    #[error("slug already in use: {0}")]
    DuplicateSlug(String),
    #[error("invalid article: {0}")]
    Invalid(String),
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn create(&self, article: NewArticle) -> Result<Article, StoreError>;
    async fn get(&self, slug: &str) -> Result<Article, StoreError>;
    async fn update(&self, slug: &str, update: ArticleUpdate) -> Result<Article, StoreError> {
        // validate everything before the live article is touched
        for (field, value) in [
            ("title", &update.title),
            ("content", &update.content),
            ("locale", &update.locale),
        ] {
            if let Some(value) = value {
                require(field, value)?;
            }
        }

        let mut articles = self.articles.write().await;

        let new_slug = match update.slug.as_deref() {
            Some(requested) => {
                let normalized = normalize_slug(Some(requested), "")?;
                if normalized != slug && articles.iter().any(|a| a.slug == normalized) {
                    return Err(StoreError::DuplicateSlug(normalized));
                }
                Some(normalized)
            }
            None => None,
        };

        let article = articles
            .iter_mut()
            .find(|a| a.slug == slug)
            .ok_or_else(|| StoreError::NotFound(slug.to_string()))?;

        if let Some(title) = update.title {
            article.title = title.trim().to_string();
        }
        if let Some(content) = update.content {
            article.content = content;
        }
        if let Some(excerpt) = update.excerpt {
            article.excerpt = excerpt.trim().to_string();
        }
        if let Some(cover_image) = update.cover_image {
            article.cover_image = Some(cover_image).filter(|c| !c.is_empty());
        }
        if let Some(locale) = update.locale {
            article.locale = locale;
        }
        if let Some(slug) = new_slug {
            article.slug = slug;
        }

        let now = OffsetDateTime::now_utc();
        match update.publish {
            Some(true) if article.published_at.is_none() => article.published_at = Some(now),
            Some(false) => article.published_at = None,
            _ => {}
        }
        article.updated_at = now;
        Ok(article.clone())
    }

    async fn delete(&self, slug: &str) -> Result<(), StoreError>;
    async fn list(&self, query: &ListQuery) -> Result<ArticlePage, StoreError>;
}

fn normalize_slug(slug: Option<&str>, title: &str) -> Result<String, StoreError> {
    let slug = slug
        .map(slug::slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slug::slugify(title));
    if slug.is_empty() {
        return Err(StoreError::Invalid("a slug could not be derived from the title".to_string()));
    }
    Ok(slug)
}

fn require(field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Invalid(format!("{field} is required")));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct MemoryArticleStore {
    articles: RwLock<Vec<Article>>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn create(&self, article: NewArticle) -> Result<Article, StoreError> {
        require("title", &article.title)?;
        require("content", &article.content)?;
        require("locale", &article.locale)?;
        let slug = normalize_slug(article.slug.as_deref(), &article.title)?;

        let mut articles = self.articles.write().await;
        if articles.iter().any(|a| a.slug == slug) {
            return Err(StoreError::DuplicateSlug(slug));
        }

        let now = OffsetDateTime::now_utc();
        let created = Article {
            id: Uuid::new_v4(),
            title: article.title.trim().to_string(),
            slug,
            excerpt: article.excerpt.trim().to_string(),
            content: article.content,
            cover_image: article.cover_image,
            locale: article.locale,
            published_at: article.publish.then_some(now),
            created_at: now,
            updated_at: now,
        };
        articles.push(created.clone());
        tracing::info!(slug = %created.slug, published = created.is_published(), "article created");
        Ok(created)
    }

    async fn get(&self, slug: &str) -> Result<Article, StoreError> {
        self.articles
            .read()
            .await
            .iter()
            .find(|a| a.slug == slug)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(slug.to_string()))
    }

    async fn update(&self, slug: &str, update: ArticleUpdate) -> Result<Article, StoreError> {
        let mut articles = self.articles.write().await;

        let new_slug = match update.slug.as_deref() {
            Some(requested) => {
                let normalized = normalize_slug(Some(requested), "")?;
                if normalized != slug && articles.iter().any(|a| a.slug == normalized) {
                    return Err(StoreError::DuplicateSlug(normalized));
                }
                Some(normalized)
            }
            None => None,
        };

        let article = articles
            .iter_mut()
            .find(|a| a.slug == slug)
            .ok_or_else(|| StoreError::NotFound(slug.to_string()))?;

        if let Some(title) = update.title {
            require("title", &title)?;
            article.title = title.trim().to_string();
        }
        if let Some(content) = update.content {
            require("content", &content)?;
            article.content = content;
        }
        if let Some(excerpt) = update.excerpt {
            article.excerpt = excerpt.trim().to_string();
        }
        if let Some(cover_image) = update.cover_image {
            article.cover_image = Some(cover_image).filter(|c| !c.is_empty());
        }
        if let Some(locale) = update.locale {
            require("locale", &locale)?;
            article.locale = locale;
        }
        if let Some(slug) = new_slug {
            article.slug = slug;
        }

        let now = OffsetDateTime::now_utc();
        match update.publish {
            Some(true) if article.published_at.is_none() => article.published_at = Some(now),
            Some(false) => article.published_at = None,
            _ => {}
        }
        article.updated_at = now;
        Ok(article.clone())
    }

    async fn delete(&self, slug: &str) -> Result<(), StoreError> {
        let mut articles = self.articles.write().await;
        let before = articles.len();
        articles.retain(|a| a.slug != slug);
        if articles.len() == before {
            return Err(StoreError::NotFound(slug.to_string()));
        }
        tracing::info!(slug, "article deleted");
        Ok(())
    }

    async fn list(&self, query: &ListQuery) -> Result<ArticlePage, StoreError> {
        let per_page = match query.per_page {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        let page = query.page.max(1);

        let articles = self.articles.read().await;
        let mut matching: Vec<&Article> = articles
            .iter()
            .filter(|a| !query.published_only || a.is_published())
            .filter(|a| {
                query
                    .locale
                    .as_deref()
                    .is_none_or(|locale| a.locale.eq_ignore_ascii_case(locale))
            })
            .collect();
        // newest first
        matching.sort_by(|a, b| {
            let a_key = a.published_at.unwrap_or(a.created_at);
            let b_key = b.published_at.unwrap_or(b.created_at);
            b_key.cmp(&a_key).then_with(|| b.created_at.cmp(&a.created_at))
        });

        let total = matching.len();
        let items = matching
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .cloned()
            .collect();

        Ok(ArticlePage {
            items,
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_article(title: &str, locale: &str, publish: bool) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            content: "Body".to_string(),
            locale: locale.to_string(),
            publish,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug() {
        let store = MemoryArticleStore::new();
        let article = store.create(new_article("Hello Edge World", "en", false)).await.unwrap();
        assert_eq!(article.slug, "hello-edge-world");
        assert!(!article.is_published());
        assert_eq!(store.get("hello-edge-world").await.unwrap().id, article.id);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let store = MemoryArticleStore::new();
        store.create(new_article("Same", "en", false)).await.unwrap();
        assert_eq!(
            store.create(new_article("Same", "fr", false)).await,
            Err(StoreError::DuplicateSlug("same".to_string()))
        );
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let store = MemoryArticleStore::new();
        let mut article = new_article("Title", "en", false);
        article.content = "  ".to_string();
        assert!(matches!(store.create(article).await, Err(StoreError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_update_publish_and_rename() {
        let store = MemoryArticleStore::new();
        store.create(new_article("First", "en", false)).await.unwrap();
        store.create(new_article("Second", "en", false)).await.unwrap();

        let updated = store
            .update(
                "first",
                ArticleUpdate {
                    slug: Some("Renamed Post".to_string()),
                    publish: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.slug, "renamed-post");
        assert!(updated.is_published());
        assert!(matches!(store.get("first").await, Err(StoreError::NotFound(_))));

        let clash = store
            .update(
                "second",
                ArticleUpdate {
                    slug: Some("renamed-post".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(clash, Err(StoreError::DuplicateSlug(_))));
    }

    #[tokio::test]
    async fn test_rejected_update_changes_nothing() {
        let store = MemoryArticleStore::new();
        let original = store.create(new_article("Original", "en", false)).await.unwrap();

        let result = store
            .update(
                "original",
                ArticleUpdate {
                    title: Some("Changed".to_string()),
                    content: Some("   ".to_string()),
                    publish: Some(true),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::Invalid(_))));
        assert_eq!(store.get("original").await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_list_huge_page_is_empty() {
        let store = MemoryArticleStore::new();
        store.create(new_article("Only", "en", true)).await.unwrap();

        let query = ListQuery {
            page: usize::MAX,
            per_page: DEFAULT_PAGE_SIZE,
            ..Default::default()
        };
        let page = store.list(&query).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 1);
        assert_eq!(page.page, usize::MAX);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryArticleStore::new();
        store.create(new_article("Gone", "en", true)).await.unwrap();
        store.delete("gone").await.unwrap();
        assert!(matches!(store.delete("gone").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let store = MemoryArticleStore::new();
        for i in 0..5 {
            store.create(new_article(&format!("En {i}"), "en", true)).await.unwrap();
        }
        store.create(new_article("Draft", "en", false)).await.unwrap();
        store.create(new_article("Fr", "fr", true)).await.unwrap();

        let query = ListQuery {
            locale: Some("en".to_string()),
            published_only: true,
            page: 2,
            per_page: 2,
        };
        let page = store.list(&query).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|a| a.locale == "en" && a.is_published()));

        let all = store.list(&ListQuery::default()).await.unwrap();
        assert_eq!(all.total, 7);
        assert_eq!(all.page, 1);
        assert_eq!(all.per_page, DEFAULT_PAGE_SIZE);
    }
}
