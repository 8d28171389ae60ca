use std::sync::Arc;

use anyhow::Context;
use edgepress_ai::{
    AiClient, ArticleGenerator, FsObjectStore, ImageGenerator, MemoryObjectStore, MockAiClient,
    ObjectStore, WorkersAiClient,
};
use edgepress_i18n::LocaleRegistry;

use crate::config::WebConfig;
use crate::store::{ArticleStore, MemoryArticleStore};

#[derive(Clone)]
pub struct AppState {
    pub articles: Arc<dyn ArticleStore>,
    pub writer: Arc<ArticleGenerator>,
    pub images: Arc<ImageGenerator>,
    pub registry: Arc<LocaleRegistry>,
    pub admin_token: Arc<str>,
    pub site_url: Arc<str>,
}

impl AppState {
    pub fn from_config(config: &WebConfig) -> anyhow::Result<Self> {
        if config.admin_token.trim().is_empty() {
            anyhow::bail!("admin token cannot be empty");
        }

        let registry = match &config.locales_file {
            Some(path) => LocaleRegistry::from_file(path)
                .with_context(|| format!("loading locales from {}", path.display()))?,
            None => LocaleRegistry::default(),
        };

        let client: Arc<dyn AiClient> = if config.mock_ai {
            tracing::warn!("using the offline mock AI client");
            Arc::new(MockAiClient::constant(mock_article()))
        } else {
            let ai = config.ai.clone().into_config()?;
            Arc::new(WorkersAiClient::new(ai).context("creating the Workers AI client")?)
        };

        let media: Arc<dyn ObjectStore> = match &config.media_dir {
            Some(dir) => Arc::new(FsObjectStore::new(dir)),
            None => Arc::new(MemoryObjectStore::new()),
        };

        let writer = ArticleGenerator::new(client.clone(), registry.clone())
            .with_model(config.ai.text_model.clone());
        let images = ImageGenerator::new(client)
            .with_model(config.ai.image_model.clone())
            .with_store(media);

        Ok(Self {
            articles: Arc::new(MemoryArticleStore::new()),
            writer: Arc::new(writer),
            images: Arc::new(images),
            registry: Arc::new(registry),
            admin_token: Arc::from(config.admin_token.as_str()),
            site_url: Arc::from(config.site_url()),
        })
    }
}

fn mock_article() -> String {
    serde_json::json!({
        "title": "Offline Draft",
        "excerpt": "Generated without a model.",
        "content": "## Offline\n\nThis article was produced by the mock AI client."
    })
    .to_string()
}
