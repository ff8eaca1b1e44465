//! rextract CLI - extract-method refactoring for Ruby sources.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let succeeded = match cli.command {
        Commands::Extract(args) => cli::extract_command(args)?,
        Commands::PrintDefaultConfig => {
            cli::print_default_config()?;
            true
        }
        Commands::InitConfig(args) => cli::init_config(args)?,
        Commands::ValidateConfig(args) => cli::validate_config(args)?,
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
