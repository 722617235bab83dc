//! SearchChat-RS: a conversational assistant grounded in live web search
//!
//! This is the main entry point for the application.

use anyhow::{Context, Result};
use searchchat_rs::{
    config,
    memory::ConversationMemory,
    network::HttpClient,
    Assistant, OllamaClient, Retriever,
};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings_path = config::locate();
    let settings = config::load_from(settings_path.as_deref()).context("invalid configuration")?;

    // Initialize logging on stderr, keeping stdout for the conversation
    let default_level = if settings.general.debug { "debug" } else { "info" };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting SearchChat-RS v{}", searchchat_rs::VERSION);
    match settings_path {
        Some(path) => info!("Loaded settings from: {}", path.display()),
        None => info!("No settings file found, using defaults"),
    }

    let model_config = settings.model_config();

    // Initialize the language model backend
    let llm = OllamaClient::new(&settings.model.base_url, &model_config.model_name)
        .context("failed to initialize LLM")?;
    match llm.probe().await {
        Ok(true) => info!("Using model {}", model_config.model_name),
        Ok(false) => warn!(
            "Model {} is not installed; run `ollama pull {}`",
            model_config.model_name, model_config.model_name
        ),
        Err(e) => warn!("{}", e),
    }

    // Initialize the search tool
    let client = HttpClient::with_settings(&settings.search)?;
    let retriever = Retriever::with_settings(client, &settings.search);
    info!("Search endpoint: {}", settings.search.endpoint);

    let mut assistant = Assistant::new(model_config, Arc::new(retriever), Arc::new(llm))
        .with_memory(ConversationMemory::with_settings(&settings.memory));

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    assistant.run(stdin, &mut stdout).await?;

    Ok(())
}
