// This is the entry point of the Google Ads dashboard API.
//
// **Architecture Overview:**
// - `core/` = Business logic (credential + manager resolution, analyzers, optimizations, insights)
// - `infra/` = Implementations of core traits (SQLite/in-memory stores, Google Ads, OAuth, OpenAI)
// - `http/` = axum adapters (routes, session auth, JSON envelope)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Start the HTTP server

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "http/http_layer.rs"]
mod http;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, StorageBackend};
use crate::core::ai::{AiConfig, AiProvider, AiService};
use crate::core::credentials::{CredentialResolver, CredentialStore, TokenProvider};
use crate::core::google_ads::GoogleAdsApi;
use crate::core::hierarchy::HierarchyStore;
use crate::core::insights::InsightService;
use crate::http::AppState;
use crate::infra::ai::OpenAiClient;
use crate::infra::google_ads::{GoogleAdsClient, GoogleOAuthClient};
use crate::infra::storage::{
    connect_sqlite, InMemoryCredentialStore, InMemoryHierarchyStore, SqliteCredentialStore,
    SqliteHierarchyStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let (credential_store, hierarchy_store): (Box<dyn CredentialStore>, Box<dyn HierarchyStore>) =
        match config.storage {
            StorageBackend::Sqlite => {
                let pool = connect_sqlite(&config.database_url).await?;

                let credentials = SqliteCredentialStore::new(pool.clone());
                credentials
                    .migrate()
                    .await
                    .context("failed to migrate credentials table")?;
                let hierarchy = SqliteHierarchyStore::new(pool);
                hierarchy
                    .migrate()
                    .await
                    .context("failed to migrate hierarchy table")?;

                tracing::info!(database_url = config.database_url.as_str(), "Using SQLite storage");
                (Box::new(credentials), Box::new(hierarchy))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; credentials are lost on restart");
                (
                    Box::new(InMemoryCredentialStore::new()),
                    Box::new(InMemoryHierarchyStore::new()),
                )
            }
        };

    let tokens: Arc<dyn TokenProvider> = Arc::new(GoogleOAuthClient::new(&config.oauth_token_url)?);
    if config.shared_credentials.is_none() {
        tracing::info!("No shared Google Ads credentials configured; users must bring their own");
    }
    let credentials = CredentialResolver::new(
        credential_store,
        tokens,
        config.shared_credentials.clone(),
    );

    let ads: Arc<dyn GoogleAdsApi> = Arc::new(GoogleAdsClient::new(
        &config.ads_api_base_url,
        &config.ads_api_version,
    )?);

    // AI is optional. Without a key every insight uses the static fallback.
    let ai = match config.openai_api_key.clone() {
        Some(api_key) => {
            let client = OpenAiClient::new(api_key, &config.openai_base_url)
                .map_err(|e| anyhow::anyhow!("failed to create OpenAI client: {e}"))?;
            let provider: Box<dyn AiProvider> = Box::new(client);
            tracing::info!(model = config.openai_model.as_str(), "AI insights enabled");
            Some(AiService::new(provider, AiConfig::for_model(config.openai_model.clone())))
        }
        None => {
            tracing::info!("OPENAI_API_KEY not set; AI insights use the static fallback");
            None
        }
    };

    let state = AppState::new(
        credentials,
        ads,
        hierarchy_store,
        config.persist_hierarchy,
        InsightService::new(ai),
        &config.session_jwt_secret,
    );

    http::serve(config.bind_addr, state).await
}
