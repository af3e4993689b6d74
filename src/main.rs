//! Axum WebSocket Chat Relay Server
//!
//! Entry point for the chat relay: loads configuration, fails fast on a
//! missing credential, then serves the `/ws/chat` endpoint.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use axum_ws_relay::config::{AppConfig, load_llm_settings};
use axum_ws_relay::llm::ChatCompletionsDriver;
use axum_ws_relay::{AppState, server};

#[tokio::main]
async fn main() {
    // Initialize tracing (M-LOG-STRUCTURED)
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // Load .env (if present)
    let _ = dotenv();

    // Load application configuration
    let config = match AppConfig::load() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Load LLM settings. A missing credential is a fatal startup condition:
    // the endpoint must never become reachable without one.
    let settings = match load_llm_settings() {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("Configuration error: {msg}");
            std::process::exit(1);
        }
    };

    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        "LLM configuration loaded"
    );

    let driver = Arc::new(ChatCompletionsDriver::new(settings));
    let state = AppState::new(config, driver);

    if let Err(e) = server::start_server(state).await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
