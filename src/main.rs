mod agent;
mod ai;
mod blackboard;
mod bus;
mod config;
mod errors;
mod http;
mod protocol;
mod search;
mod swarm;
mod task;
#[cfg(test)]
mod testutil;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::ai::OpenAiClient;
use crate::blackboard::InMemoryBlackboard;
use crate::bus::InProcessBus;
use crate::search::{SearchClient, TavilyClient};
use crate::swarm::Swarm;

#[derive(Parser)]
#[command(name = "swarmd", about = "Mission-driven agent swarm daemon", version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon in the foreground
    Serve {
        /// Override the ingress port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stdout)
        .init();

    let Commands::Serve { port } = cli.command;

    // Load config (env vars alone are enough when no file exists)
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let config = if config_path.exists() {
        config::AppConfig::load(&config_path)?.with_env_overrides()
    } else if config::AppConfig::has_required_env_vars() {
        config::AppConfig::default().with_env_overrides()
    } else {
        anyhow::bail!(
            "No config at {} and no SWARMD_LLM_API_KEY/OPENAI_API_KEY set. \
             Create the file or export an API key.",
            config_path.display()
        );
    };
    info!("Config loaded");
    let port = port.unwrap_or(config.port);

    let bus = Arc::new(InProcessBus::new());
    let blackboard = Arc::new(InMemoryBlackboard::new());
    let llm = Arc::new(OpenAiClient::new(
        &config.llm.api_key,
        &config.llm.base_url,
        &config.llm.model,
    ));
    let search: Option<Arc<dyn SearchClient>> = if config.search.tavily_api_key.is_empty() {
        None
    } else {
        Some(Arc::new(TavilyClient::new(&config.search.tavily_api_key)))
    };

    let swarm = Swarm::start(bus.clone(), blackboard, llm, search).await?;
    http::start_server(port, bus.clone(), swarm.agent_states().to_vec()).await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    swarm.shutdown().await;
    Ok(())
}
