//! Archetype sync CLI - run and inspect syncs from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sync one customer, exactly as the HTTP endpoint would
//! archetype-sync-cli sync --email ada@example.com --archetype Visionary
//!
//! # Read the stored archetype back
//! archetype-sync-cli show --email ada@example.com
//!
//! # Validate the environment without calling Shopify
//! archetype-sync-cli check-config
//! ```
//!
//! Configuration comes from the same environment variables (and `.env`) as
//! the server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "archetype-sync-cli")]
#[command(author, version, about = "Archetype sync CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync an archetype to a customer (find or create, then set metafield)
    Sync {
        /// Customer email address
        #[arg(short, long)]
        email: String,

        /// Archetype to store (defaults to "Unknown")
        #[arg(short, long)]
        archetype: Option<String>,

        /// First name, used if the customer is created
        #[arg(long)]
        first_name: Option<String>,

        /// Last name, used if the customer is created
        #[arg(long)]
        last_name: Option<String>,

        /// Phone, used if the customer is created
        #[arg(long)]
        phone: Option<String>,
    },
    /// Show the archetype metafield stored for a customer
    Show {
        /// Customer email address
        #[arg(short, long)]
        email: String,
    },
    /// Load and validate configuration, then print a redacted summary
    CheckConfig,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "archetype_sync=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Sync {
            email,
            archetype,
            first_name,
            last_name,
            phone,
        } => {
            commands::sync::run(archetype_sync::sync::SyncPayload {
                email: Some(email),
                archetype,
                first_name,
                last_name,
                phone,
            })
            .await?;
        }
        Commands::Show { email } => commands::sync::show(&email).await?,
        Commands::CheckConfig => commands::config::check()?,
    }
    Ok(())
}
