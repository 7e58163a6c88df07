//! assetwright CLI — the main entry point.
//!
//! Commands:
//! - `onboard`    — Initialize config & corpus directory
//! - `configure`  — Build a configuration conversationally
//! - `classify`   — Route a request to its domain
//! - `schema`     — Show a domain's fields
//! - `curate`     — Filter the training corpus, optionally fine-tune
//! - `gateway`    — Start the HTTP server
//! - `doctor`     — Diagnose system health

use assetwright_core::Domain;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "assetwright",
    about = "assetwright — natural-language configuration for tokenized assets",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and corpus directory
    Onboard,

    /// Build a configuration through an iterative conversation
    Configure {
        /// Domain to configure (payment-stream, token-vault, token-creation).
        /// Classified from the first message when omitted.
        #[arg(short, long)]
        domain: Option<Domain>,

        /// First message; prompted for when omitted
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Classify a request into a domain and a rephrased prompt
    Classify {
        /// The request to classify
        text: String,
    },

    /// Print the field schema of a domain
    Schema {
        #[arg(short, long)]
        domain: Domain,
    },

    /// Curate store-worthy interactions for fine-tuning
    Curate {
        #[arg(short, long)]
        domain: Domain,

        /// Submit a fine-tuning job once the curated file is written
        #[arg(long)]
        submit: bool,
    },

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Configure { domain, message } => commands::configure::run(domain, message).await?,
        Commands::Classify { text } => commands::classify::run(&text).await?,
        Commands::Schema { domain } => commands::schema::run(domain),
        Commands::Curate { domain, submit } => commands::curate::run(domain, submit).await?,
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
