use crate::llm::{LlmSettings, Provider};
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;

/// Built-in product-support system prompt.
///
/// Substitutable data: deployments override it via the config file or the
/// `RELAY_CHAT__SYSTEM_PROMPT` environment variable.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a sales and support assistant for a flow-control instrumentation \
company. Present the product catalog using technical product names with \
short, precise descriptions: mechanical and electromagnetic flow meters for \
pool, spa, and industrial piping; digital monitoring upgrades with remote \
flow alarms; wireless water-level autofill systems; predictive motor \
protection devices; and variable-speed drive solutions. Clarify technical \
terms on request, and keep answers concise and accurate.";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Host to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Origin allow-list enforced by the CORS layer before the WebSocket
    /// upgrade reaches the relay.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Seed instruction for every session.
    pub system_prompt: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder();

        // Defaults
        builder = builder
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default(
                "cors.allowed_origins",
                vec!["http://localhost:5500".to_string()],
            )?
            .set_default("chat.system_prompt", DEFAULT_SYSTEM_PROMPT)?;

        // Optional config file (CLI flag or CONFIG_FILE env via clap)
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path));
        }

        // Environment variables prefixed with RELAY_, e.g. RELAY_SERVER__PORT=8000.
        // The origin allow-list is comma-separated: RELAY_CORS__ALLOWED_ORIGINS=a,b
        //
        // The key separator is `__`; the prefix separator must stay a single
        // `_` or the source would only match RELAY__-prefixed variables.
        builder = builder.add_source(
            Environment::with_prefix("RELAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("cors.allowed_origins"),
        );

        // CLI flags win over everything else
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}

/// Load remote-service settings from the environment.
///
/// The API key is the one startup-fatal requirement: without it the process
/// must not start, so this returns an error the caller aborts on.
pub fn load_llm_settings() -> Result<LlmSettings, String> {
    let api_key = env::var("LLM_API_KEY")
        .map_err(|_| "Missing required env var: LLM_API_KEY".to_string())?;
    if api_key.trim().is_empty() {
        return Err("LLM_API_KEY cannot be empty".to_string());
    }

    let base_url =
        env::var("LLM_BASE_URL").unwrap_or_else(|_| "https://api.openai.com".to_string());
    let model = env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

    // Auto-detect provider from base URL
    let mut provider = Provider::detect_from_url(&base_url);

    // Load Azure-specific settings if needed
    if let Provider::AzureOpenAI { .. } = &provider {
        if let Ok(deployment) = env::var("AZURE_DEPLOYMENT_NAME") {
            provider = Provider::AzureOpenAI {
                deployment_name: deployment,
                api_version: env::var("AZURE_API_VERSION")
                    .unwrap_or_else(|_| "2024-08-01-preview".to_string()),
            };
        }
    }

    Ok(LlmSettings {
        base_url,
        api_key,
        model,
        provider,
    })
}
