//! Settings for the remote AI provider
//!
//! Nothing here is read implicitly: binaries build an [`AiConfig`] from
//! [`AiArgs`] (flags with environment fallbacks) and pass it down.

use std::time::Duration;

use clap::Args;

use crate::error::{AiError, AiResult};

pub const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";
pub const DEFAULT_TEXT_MODEL: &str = "@cf/meta/llama-4-scout-17b-16e-instruct";
pub const DEFAULT_IMAGE_MODEL: &str = "@cf/black-forest-labs/flux-1-schnell";
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Clone)]
pub struct AiConfig {
    pub account_id: String,
    pub api_token: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub max_tokens: u32,
    /// Per-request timeout enforced by the HTTP client
    pub timeout: Duration,
}

impl AiConfig {
    pub fn new(account_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            api_token: api_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read `CLOUDFLARE_ACCOUNT_ID` and `CLOUDFLARE_API_TOKEN`.
    pub fn from_env() -> AiResult<Self> {
        let account_id = std::env::var("CLOUDFLARE_ACCOUNT_ID").map_err(|_| {
            AiError::Config("CLOUDFLARE_ACCOUNT_ID environment variable not set".to_string())
        })?;
        let api_token = std::env::var("CLOUDFLARE_API_TOKEN").map_err(|_| {
            AiError::Config("CLOUDFLARE_API_TOKEN environment variable not set".to_string())
        })?;
        Ok(Self::new(account_id, api_token))
    }

    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn validate(&self) -> AiResult<()> {
        if self.account_id.trim().is_empty() {
            return Err(AiError::Config("account id cannot be empty".to_string()));
        }
        if self.api_token.trim().is_empty() {
            return Err(AiError::Config("API token cannot be empty".to_string()));
        }
        if self.text_model.trim().is_empty() || self.image_model.trim().is_empty() {
            return Err(AiError::Config("model identifiers cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("account_id", &self.account_id)
            .field("api_token", &"***")
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Command-line flags shared by every binary that talks to the AI provider.
#[derive(Debug, Clone, Args)]
pub struct AiArgs {
    /// Cloudflare account id
    #[arg(long, env = "CLOUDFLARE_ACCOUNT_ID", hide_env_values = true)]
    pub account_id: Option<String>,

    /// Cloudflare API token with Workers AI access
    #[arg(long, env = "CLOUDFLARE_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Text generation model
    #[arg(long = "model", env = "EDGEPRESS_TEXT_MODEL", default_value = DEFAULT_TEXT_MODEL)]
    pub text_model: String,

    /// Image generation model
    #[arg(long, env = "EDGEPRESS_IMAGE_MODEL", default_value = DEFAULT_IMAGE_MODEL)]
    pub image_model: String,

    /// API base URL
    #[arg(long, env = "EDGEPRESS_AI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub ai_base_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub ai_timeout_secs: u64,
}

impl AiArgs {
    pub fn into_config(self) -> AiResult<AiConfig> {
        let account_id = self.account_id.ok_or_else(|| {
            AiError::Config(
                "missing account id (set CLOUDFLARE_ACCOUNT_ID or pass --account-id)".to_string(),
            )
        })?;
        let api_token = self.api_token.ok_or_else(|| {
            AiError::Config(
                "missing API token (set CLOUDFLARE_API_TOKEN or pass --api-token)".to_string(),
            )
        })?;

        let mut config = AiConfig::new(account_id, api_token)
            .with_text_model(self.text_model)
            .with_image_model(self.image_model)
            .with_base_url(self.ai_base_url);
        config.timeout = Duration::from_secs(self.ai_timeout_secs);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> AiArgs {
        AiArgs {
            account_id: Some("acct".to_string()),
            api_token: Some("token".to_string()),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            ai_base_url: "https://example.test/v4/".to_string(),
            ai_timeout_secs: 5,
        }
    }

    #[test]
    fn test_into_config() {
        let config = args().into_config().unwrap();
        assert_eq!(config.base_url, "https://example.test/v4");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.text_model, DEFAULT_TEXT_MODEL);
    }

    #[test]
    fn test_missing_token() {
        let mut args = args();
        args.api_token = None;
        assert!(matches!(args.into_config(), Err(AiError::Config(msg)) if msg.contains("token")));
    }

    #[test]
    fn test_blank_account_rejected() {
        let mut args = args();
        args.account_id = Some("  ".to_string());
        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_debug_masks_token() {
        let config = AiConfig::new("acct", "secret-token");
        let debug = format!("{config:?}");
        assert!(debug.contains("***"));
        assert!(!debug.contains("secret-token"));
    }
}
