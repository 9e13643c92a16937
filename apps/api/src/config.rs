use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_MODEL;

/// Gemini credentials and model choice. Shared by the server and `list-models`.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

impl GeminiConfig {
    pub fn from_env() -> Result<Self> {
        Ok(GeminiConfig {
            api_key: require_env("GEMINI_API_KEY")?,
            model: optional_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    /// When unset, roadmaps are kept in memory only.
    pub database_url: Option<String>,
    /// Header carrying the caller's user id, set by the auth gateway.
    pub identity_header: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        load_dotenv();

        Ok(Config {
            gemini: GeminiConfig::from_env()?,
            database_url: optional_env("DATABASE_URL"),
            identity_header: optional_env("IDENTITY_HEADER")
                .unwrap_or_else(|| "x-user-id".to_string())
                .to_ascii_lowercase(),
            port: optional_env("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Loads `.env.local` then `.env` if present; variables already set win.
pub fn load_dotenv() {
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();
}

fn require_env(key: &str) -> Result<String> {
    optional_env(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
