use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod admin;
mod app;
mod auth;
mod config;
mod error;
mod public;
mod sitemap;
mod state;
mod store;

use config::WebConfig;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .init();

    let config = WebConfig::parse();
    let state = AppState::from_config(&config)?;
    info!(
        locales = state.registry.all().len(),
        site_url = %state.site_url,
        "starting edgepress API server"
    );

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    info!("listening on http://{}", config.bind);

    axum::serve(listener, app::router(state)).await?;
    Ok(())
}
