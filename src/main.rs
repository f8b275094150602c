use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use learnpath::config::Config;
use learnpath::server::{start_server, ServerConfig, DEFAULT_PORT};

#[derive(Parser)]
#[command(name = "learnpath")]
#[command(about = "Study-plan generation service driven by an LLM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Enable permissive CORS (for a local frontend)
        #[arg(long, default_value = "false")]
        cors: bool,
    },
    /// Configure learnpath
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
        /// Set API key
        #[arg(long)]
        api_key: Option<String>,
        /// Set model
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "learnpath=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host, cors } => {
            start_server(ServerConfig {
                port,
                host,
                cors_enabled: cors,
            })
            .await?;
        }
        Commands::Config {
            show,
            api_key,
            model,
        } => {
            handle_config(show, api_key, model)?;
        }
    }

    Ok(())
}

fn handle_config(show: bool, api_key: Option<String>, model: Option<String>) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        println!("Provider: {:?}", config.llm.provider);
        println!("Model: {}", config.llm.model);
        println!(
            "API key: {}",
            if config.llm.api_key.is_some() {
                "configured"
            } else {
                "not set"
            }
        );
        println!("Retry cap: {}", config.policy.retry_cap);
        println!("Follow-up threshold: {}", config.policy.followup_threshold);
        println!("Session TTL: {} minutes", config.policy.session_ttl_minutes);
        return Ok(());
    }

    let mut changed = false;
    if let Some(key) = api_key {
        config.llm.api_key = Some(key);
        changed = true;
    }
    if let Some(model) = model {
        config.llm.model = model;
        changed = true;
    }

    if changed {
        config.save()?;
        println!("Configuration saved to {}", Config::config_path()?.display());
    } else {
        println!("Nothing to change; use --show, --api-key or --model");
    }

    Ok(())
}
