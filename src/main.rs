use anyhow::{Context, Result};
use axum::Router;
use reqwest::Client;
use std::{net::SocketAddr, sync::Arc, time::Instant};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use vamcar::config::Settings;
use vamcar::encar_api::EncarClient;
use vamcar::{AppState, routes};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vamcar=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("Initializing VamCar server...");

    // Load configuration
    let settings = match Settings::new() {
        Ok(s) => {
            tracing::info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };
    let shared_settings = Arc::new(settings);

    // One shared reqwest client for the API layer and the proxy
    let http_client = Arc::new(
        Client::builder()
            .user_agent(concat!("vamcar/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build shared reqwest client")?,
    );
    tracing::info!("Shared HTTP client created.");

    // Server-rendering context talks to the upstream directly, key attached
    let api = Arc::new(EncarClient::direct(
        &shared_settings,
        (*http_client).clone(),
    ));

    let app_state = AppState {
        settings: Arc::clone(&shared_settings),
        http_client: Arc::clone(&http_client),
        api,
        started_at: Instant::now(),
    };

    let router: Router = routes::create_router(app_state.clone());

    // Combine the router with static file serving and request tracing
    let app = router
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http());

    // Parse the server address from settings
    let addr: SocketAddr = match app_state.settings.server_address.parse() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(
                "Invalid server address format in configuration ('{}'): {}",
                app_state.settings.server_address,
                e
            );
            return Err(anyhow::anyhow!("Invalid server address format: {}", e));
        }
    };

    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => {
            tracing::info!("Server listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
