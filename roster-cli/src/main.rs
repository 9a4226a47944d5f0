//! Roster CLI - reviewer assignment service
//!
//! Serves the HTTP API over a SQLite database and inspects configuration.

mod api;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use roster_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::ServeArgs;

/// Roster: pull request reviewer assignment
#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.config/roster/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Run the HTTP API
    #[command(visible_alias = "s")]
    Serve(ServeArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "roster=debug,tower_http=debug"
    } else {
        "roster=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let (bind, database) = match &cli.command {
        Some(Commands::Serve(args)) => (args.bind, args.database.clone()),
        _ => (None, None),
    };
    let config = Config::load_with_overrides(cli.config.as_deref(), bind, database)?;

    if cli.verbose {
        tracing::info!(
            bind = %config.server.bind,
            database = %config.database.path.display(),
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("roster {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Config) => {
            println!("Roster Configuration");
            println!("====================");
            println!();
            print!("{}", config.to_toml()?);
            println!();
            let path = cli.config.clone().or_else(Config::default_config_path);
            if let Some(path) = path {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            println!("Roster - pull request reviewer assignment");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
