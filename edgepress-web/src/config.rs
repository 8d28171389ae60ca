use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use edgepress_ai::AiArgs;

/// Command-line arguments for the edgepress API server.
#[derive(Debug, Clone, Parser)]
#[command(name = "edgepress-web", version, about = "edgepress blog and admin API")]
pub struct WebConfig {
    /// Address to listen on
    #[arg(long, env = "EDGEPRESS_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Public base URL used in the sitemap
    #[arg(long, env = "EDGEPRESS_SITE_URL", default_value = "http://localhost:3000")]
    pub site_url: String,

    /// Bearer token required on admin routes
    #[arg(long, env = "EDGEPRESS_ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: String,

    /// JSON file listing the served locales (defaults to the built-in list)
    #[arg(long, env = "EDGEPRESS_LOCALES_FILE")]
    pub locales_file: Option<PathBuf>,

    /// Store generated images under this directory (in memory when unset)
    #[arg(long, env = "EDGEPRESS_MEDIA_DIR")]
    pub media_dir: Option<PathBuf>,

    /// Answer AI requests with canned offline responses
    #[arg(long)]
    pub mock_ai: bool,

    #[command(flatten)]
    pub ai: AiArgs,
}

impl WebConfig {
    pub fn site_url(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }
}
