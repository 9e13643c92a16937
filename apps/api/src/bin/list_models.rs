//! Diagnostic: lists the Gemini models visible to the configured API key.
//!
//! Reads `GEMINI_API_KEY` from the environment, `.env.local` or `.env`.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use xplore_api::config::{load_dotenv, GeminiConfig};
use xplore_api::llm_client::GeminiClient;

#[derive(Debug, Parser)]
#[command(name = "list-models", about = "List Gemini models available to GEMINI_API_KEY")]
struct Args {
    /// Only show models whose name contains this text.
    #[arg(long, default_value = "flash")]
    filter: String,

    /// Show every model, ignoring --filter.
    #[arg(long)]
    all: bool,

    /// Query a different API root.
    #[arg(long, env = "GEMINI_API_BASE")]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    load_dotenv();
    let args = Args::parse();
    let gemini = GeminiConfig::from_env().context("Could not find GEMINI_API_KEY")?;

    println!("Using API key ending in: {}", key_suffix(&gemini.api_key));

    let mut client = GeminiClient::new(gemini.api_key, gemini.model)?;
    if let Some(base_url) = args.base_url {
        client = client.with_base_url(base_url);
    }

    let models = client.list_models().await.context("Listing models failed")?;
    let shown: Vec<_> = models
        .iter()
        .filter(|m| args.all || m.name.contains(&args.filter))
        .collect();

    if args.all {
        println!("\nAvailable models ({}):", shown.len());
    } else {
        println!(
            "\nAvailable models matching '{}' ({} of {}):",
            args.filter,
            shown.len(),
            models.len()
        );
    }
    for model in shown {
        match &model.display_name {
            Some(display) => println!("- {} ({display})", model.name),
            None => println!("- {}", model.name),
        }
    }

    Ok(())
}

/// Last four characters of the key; never print more.
fn key_suffix(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    chars[chars.len().saturating_sub(4)..].iter().collect()
}
