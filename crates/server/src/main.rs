use std::path::PathBuf;

use mediarank_api::oauth;
use mediarank_server::{build_router, storage, AppConfig, AppState};

/// Load OAuth providers from environment variables.
fn load_oauth_providers() -> Vec<oauth::OAuthProviderConfig> {
    [try_load_github()].into_iter().flatten().collect()
}

fn try_load_github() -> Option<oauth::OAuthProviderConfig> {
    let id = std::env::var("GITHUB_CLIENT_ID")
        .ok()
        .filter(|s| !s.is_empty())?;
    let secret = std::env::var("GITHUB_CLIENT_SECRET")
        .ok()
        .filter(|s| !s.is_empty())?;
    tracing::info!("OAuth provider enabled: GitHub");
    Some(oauth::github_preset(id, secret))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediarank_server=info,tower_http=info".into()),
        )
        .init();

    // Data directory
    let data_dir = std::env::var("MEDIARANK_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"));

    tracing::info!("data directory: {}", data_dir.display());

    let db = storage::init_db(&data_dir)?;
    tracing::info!("database initialized");

    let base_url = std::env::var("BASE_URL")
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| {
            std::env::var("MEDIARANK_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| "http://localhost:3000".into());

    let oauth_providers = load_oauth_providers();
    if oauth_providers.is_empty() {
        tracing::warn!("no OAuth provider configured — login will be unavailable");
    }

    let config = AppConfig {
        base_url: base_url.clone(),
        oauth_providers,
    };

    let app = build_router(AppState { db, config });

    tracing::info!("starting server at {base_url}");

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
