//! Text-to-image generation
//!
//! Requests carry a preset aspect ratio (or a custom size) and a style. The
//! style is applied as extra prompt text, the ratio as pixel dimensions. The
//! model's base64 PNG comes back as a `data:` URL and, when a store is
//! configured, is also written to durable storage.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::client::{AiClient, ImageParams};
use crate::config::DEFAULT_IMAGE_MODEL;
use crate::error::{AiError, AiResult};
use crate::storage::ObjectStore;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";
const MAX_STEPS: u32 = 8;
const MAX_DIMENSION: u32 = 2048;
const MIN_DIMENSION: u32 = 256;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageRatio {
    #[serde(rename = "1:1")]
    Square,
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "3:2")]
    Photo,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "custom")]
    Custom,
}

impl ImageRatio {
    /// Pixel size for preset ratios; `None` for [`ImageRatio::Custom`].
    pub fn dimensions(self) -> Option<(u32, u32)> {
        match self {
            ImageRatio::Square => Some((1024, 1024)),
            ImageRatio::Landscape => Some((1280, 720)),
            ImageRatio::Standard => Some((1024, 768)),
            ImageRatio::Photo => Some((1200, 800)),
            ImageRatio::Portrait => Some((720, 1280)),
            ImageRatio::Custom => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStyle {
    #[default]
    Realistic,
    Artistic,
    Anime,
    Cinematic,
    Fantasy,
    Abstract,
}

impl ImageStyle {
    pub fn prompt_modifier(self) -> &'static str {
        match self {
            ImageStyle::Realistic => "photorealistic, highly detailed, natural lighting, sharp focus",
            ImageStyle::Artistic => "painterly style, expressive brushstrokes, rich colors, fine art",
            ImageStyle::Anime => "anime style, clean lines, vibrant colors, cel shading",
            ImageStyle::Cinematic => "cinematic lighting, dramatic composition, film still, depth of field",
            ImageStyle::Fantasy => "fantasy art, magical atmosphere, ethereal lighting, intricate details",
            ImageStyle::Abstract => "abstract art, bold shapes, vivid color fields, non-representational",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub ratio: ImageRatio,
    #[serde(default)]
    pub style: ImageStyle,
    #[serde(default)]
    pub custom_width: Option<u32>,
    #[serde(default)]
    pub custom_height: Option<u32>,
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_steps() -> u32 {
    MAX_STEPS
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: None,
            ratio: ImageRatio::default(),
            style: ImageStyle::default(),
            custom_width: None,
            custom_height: None,
            steps: MAX_STEPS,
            seed: None,
        }
    }

    /// Validate and turn into model parameters.
    pub fn to_params(&self) -> AiResult<ImageParams> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(AiError::Validation("prompt is required".to_string()));
        }

        let (width, height) = match self.ratio.dimensions() {
            Some(size) => size,
            None => match (self.custom_width, self.custom_height) {
                (Some(w), Some(h)) => (
                    w.clamp(MIN_DIMENSION, MAX_DIMENSION),
                    h.clamp(MIN_DIMENSION, MAX_DIMENSION),
                ),
                _ => {
                    return Err(AiError::Validation(
                        "custom ratio needs customWidth and customHeight".to_string(),
                    ));
                }
            },
        };

        Ok(ImageParams {
            prompt: format!("{prompt}, {}", self.style.prompt_modifier()),
            negative_prompt: self
                .negative_prompt
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            width,
            height,
            steps: self.steps.clamp(1, MAX_STEPS),
            seed: self.seed,
        })
    }
}

/// The request used for article cover images.
pub fn cover_request(title: &str) -> ImageRequest {
    ImageRequest {
        ratio: ImageRatio::Landscape,
        style: ImageStyle::Artistic,
        steps: MAX_STEPS,
        ..ImageRequest::new(format!(
            "{title} - high quality, professional blog cover image"
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub prompt: String,
    pub style: ImageStyle,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub data_url: String,
    /// Set when the image was also written to the object store
    pub object_key: Option<String>,
    pub metadata: ImageMetadata,
}

/// Normalize model output to a PNG data URL.
pub fn to_data_url(image: &str) -> String {
    if image.starts_with("data:image/") {
        image.to_string()
    } else {
        format!("{DATA_URL_PREFIX}{image}")
    }
}

/// Decode the base64 payload of a data URL (or a bare base64 string).
pub fn decode_data_url(data_url: &str) -> AiResult<Vec<u8>> {
    let payload = match data_url.split_once(";base64,") {
        Some((_, payload)) => payload,
        None => data_url,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| AiError::Response(format!("image is not valid base64: {e}")))
}

#[derive(Clone)]
pub struct ImageGenerator {
    client: Arc<dyn AiClient>,
    model: String,
    store: Option<Arc<dyn ObjectStore>>,
    key_prefix: String,
}

impl ImageGenerator {
    pub fn new(client: Arc<dyn AiClient>) -> Self {
        Self {
            client,
            model: DEFAULT_IMAGE_MODEL.to_string(),
            store: None,
            key_prefix: "images".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn generate(&self, request: &ImageRequest) -> AiResult<GeneratedImage> {
        let params = request.to_params()?;
        tracing::info!(
            width = params.width,
            height = params.height,
            steps = params.steps,
            style = ?request.style,
            "generating image"
        );

        let image = self.client.run_image(&self.model, &params).await?;
        let data_url = to_data_url(&image);
        let object_key = self.persist(&data_url).await;

        Ok(GeneratedImage {
            data_url,
            object_key,
            metadata: ImageMetadata {
                prompt: request.prompt.trim().to_string(),
                style: request.style,
                width: params.width,
                height: params.height,
                steps: params.steps,
                seed: params.seed,
            },
        })
    }

    /// Write the image to the store. Failures are logged; the inline image
    /// is still usable.
    async fn persist(&self, data_url: &str) -> Option<String> {
        let store = self.store.as_ref()?;
        let bytes = match decode_data_url(data_url) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "cannot decode generated image, not storing");
                return None;
            }
        };

        let key = format!("{}/{}.png", self.key_prefix, uuid::Uuid::new_v4());
        match store.put(&key, bytes, Some("image/png")).await {
            Ok(()) => Some(key),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to store generated image");
                None
            }
        }
    }
}

impl std::fmt::Debug for ImageGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageGenerator")
            .field("provider", &self.client.provider_name())
            .field("model", &self.model)
            .field("store", &self.store.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MOCK_PNG_BASE64, MockAiClient};
    use crate::storage::{MemoryObjectStore, StoredObject};
    use async_trait::async_trait;

    #[test]
    fn test_ratio_dimensions() {
        assert_eq!(ImageRatio::Square.dimensions(), Some((1024, 1024)));
        assert_eq!(ImageRatio::Landscape.dimensions(), Some((1280, 720)));
        assert_eq!(ImageRatio::Standard.dimensions(), Some((1024, 768)));
        assert_eq!(ImageRatio::Photo.dimensions(), Some((1200, 800)));
        assert_eq!(ImageRatio::Portrait.dimensions(), Some((720, 1280)));
        assert_eq!(ImageRatio::Custom.dimensions(), None);
    }

    #[test]
    fn test_request_from_json() {
        let request: ImageRequest = serde_json::from_str(
            r#"{"prompt": "a fox", "ratio": "9:16", "style": "anime", "negativePrompt": "blur", "steps": 20}"#,
        )
        .unwrap();
        let params = request.to_params().unwrap();
        assert_eq!((params.width, params.height), (720, 1280));
        assert_eq!(params.steps, 8);
        assert!(params.prompt.starts_with("a fox, anime style"));
        assert_eq!(params.negative_prompt.as_deref(), Some("blur"));
    }

    #[test]
    fn test_custom_size() {
        let mut request = ImageRequest::new("x");
        request.ratio = ImageRatio::Custom;
        assert!(request.to_params().is_err());

        request.custom_width = Some(5000);
        request.custom_height = Some(600);
        let params = request.to_params().unwrap();
        assert_eq!((params.width, params.height), (2048, 600));
    }

    #[test]
    fn test_empty_prompt_rejected() {
        assert!(matches!(
            ImageRequest::new("  ").to_params(),
            Err(AiError::Validation(_))
        ));
    }

    #[test]
    fn test_steps_clamped_low() {
        let mut request = ImageRequest::new("x");
        request.steps = 0;
        assert_eq!(request.to_params().unwrap().steps, 1);
    }

    #[test]
    fn test_cover_request() {
        let params = cover_request("Edge AI").to_params().unwrap();
        assert!(params.prompt.starts_with("Edge AI - high quality, professional blog cover image"));
        assert_eq!((params.width, params.height), (1280, 720));
        assert_eq!(params.steps, 8);
    }

    #[test]
    fn test_data_url() {
        assert_eq!(to_data_url("AAAA"), "data:image/png;base64,AAAA");
        assert_eq!(to_data_url("data:image/jpeg;base64,AAAA"), "data:image/jpeg;base64,AAAA");
        assert_eq!(decode_data_url("data:image/png;base64,AAEC").unwrap(), vec![0, 1, 2]);
        assert!(decode_data_url("data:image/png;base64,@@@").is_err());
    }

    #[tokio::test]
    async fn test_generate_and_store() {
        let store = Arc::new(MemoryObjectStore::new());
        let generator =
            ImageGenerator::new(Arc::new(MockAiClient::constant(""))).with_store(store.clone());

        let image = generator.generate(&cover_request("Hello")).await.unwrap();
        assert_eq!(image.data_url, format!("data:image/png;base64,{MOCK_PNG_BASE64}"));
        let key = image.object_key.unwrap();
        assert!(key.starts_with("images/") && key.ends_with(".png"));

        let stored = store.get(&key).await.unwrap().unwrap();
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(&stored.bytes[1..4], b"PNG");
        assert_eq!(image.metadata.style, ImageStyle::Artistic);
    }

    struct BrokenStore;

    #[async_trait]
    impl ObjectStore for BrokenStore {
        async fn put(&self, _: &str, _: Vec<u8>, _: Option<&str>) -> AiResult<()> {
            Err(AiError::Storage("bucket unavailable".to_string()))
        }

        async fn get(&self, _: &str) -> AiResult<Option<StoredObject>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_inline_image() {
        let generator = ImageGenerator::new(Arc::new(MockAiClient::constant("")))
            .with_store(Arc::new(BrokenStore));
        let image = generator.generate(&ImageRequest::new("a lake")).await.unwrap();
        assert!(image.data_url.starts_with("data:image/png;base64,"));
        assert_eq!(image.object_key, None);
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let client = MockAiClient::constant("").with_image(|_| {
            Err(AiError::Api {
                status: 429,
                message: "rate limited".to_string(),
            })
        });
        let generator = ImageGenerator::new(Arc::new(client));
        assert!(matches!(
            generator.generate(&ImageRequest::new("x")).await,
            Err(AiError::Api { status: 429, .. })
        ));
    }
}
