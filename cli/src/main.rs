//! terraform-provider-freebox - Freebox OS token utility
//!
//! Creates the application token the Terraform Freebox provider logs in
//! with, and reads the provider's data from the command line.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use freebox::cli::{commands, Cli, Commands};
use freebox::config::{self, settings::env};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging on stderr, stdout carries command output
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(env::LOG_LEVEL).unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Run the command
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => config::load_config_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => config::load_config()?,
    };

    match cli.command {
        Commands::CreateToken(args) => commands::handle_create_token(config, args).await?,
        Commands::ConnectionStatus(args) => {
            commands::handle_connection_status(config, args).await?;
        }
        Commands::ForgetToken { app_id } => commands::handle_forget_token(&config, app_id)?,
        Commands::Completions { shell } => commands::handle_completions(shell),
    }

    Ok(())
}
