//! Axum WebSocket Chat Relay
//!
//! A thin relay between browser WebSocket clients and an OpenAI-compatible
//! chat-completions service. Each connection owns a conversation seeded with
//! a fixed product-support system prompt; every inbound text frame yields
//! exactly one outbound text frame — the model's reply, or a fixed fallback
//! sentence when the remote call fails.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP server with one WebSocket route (`/ws/chat`)
//! - **LLM driver**: non-streaming Chat Completions client over `reqwest`
//! - **Session**: per-connection turn log, owned by the handler task
//!
//! # Modules
//!
//! - [`config`]: CLI flags, layered configuration, LLM settings loader
//! - [`llm`]: driver trait, turn types, error taxonomy
//! - [`session`]: per-connection conversation state
//! - [`server`]: router construction and the relay loop

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::unused_async)]

pub mod config;
pub mod llm;
pub mod server;
pub mod session;

use crate::config::AppConfig;
use crate::llm::ChatDriver;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Remote conversational service client, shared by every connection.
    pub driver: Arc<dyn ChatDriver>,
    /// Immutable seed instruction for every session.
    pub system_prompt: Arc<str>,
    /// Global configuration.
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("system_prompt_len", &self.system_prompt.len())
            .field("config", &self.config)
            .finish()
    }
}

impl AppState {
    /// Assemble state from loaded configuration and a driver.
    #[must_use]
    pub fn new(config: Arc<AppConfig>, driver: Arc<dyn ChatDriver>) -> Self {
        let system_prompt = Arc::from(config.chat.system_prompt.as_str());
        Self {
            driver,
            system_prompt,
            config,
        }
    }
}
