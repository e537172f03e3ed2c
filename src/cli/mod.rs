//! CLI module for Flashdeck
//!
//! Provides commands:
//! - `serve`: start the HTTP server (default)
//! - `quota`: show a user's AI generation quota
//! - `init-db`: create the database schema and exit

use clap::{Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

pub mod quota;

/// Flashdeck flashcard server
#[derive(Parser, Debug)]
#[command(name = "flashdeck")]
#[command(about = "Flashcard study backend with Leitner reviews and AI card generation")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default)
    Serve,
    /// Show the AI generation quota of a user
    Quota {
        /// User id
        user_id: Uuid,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create the database schema and exit
    InitDb,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = crate::server::load_config()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            info!("Starting Flashdeck v{}", env!("CARGO_PKG_VERSION"));
            crate::server::run(config).await
        }
        Commands::Quota { user_id, json } => quota::run(&config, user_id, json).await,
        Commands::InitDb => {
            crate::server::open_store(&config).await?;
            println!("Database ready at {}", config.db_path().display());
            Ok(())
        }
    }
}
