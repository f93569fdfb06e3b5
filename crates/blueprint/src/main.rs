//! Blueprint CLI entry point

use anyhow::{Context, Result};
use blueprint::cli;
use blueprint_logging::{init_logging, LogConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "blueprint", version, about = "Stage, validate, and commit event schema edits")]
struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Path to config.toml (default: ~/.blueprint/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show an event's current schema
    Show {
        /// Event name
        event: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the transformers the service accepts
    Types {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply an edit plan to an event's schema and commit it
    Edit {
        /// Event name
        event: String,

        /// TOML plan with [[add]], [[delete]], and [[rename]] entries
        #[arg(short, long)]
        plan: PathBuf,

        /// Validate and print the request without sending it
        #[arg(long)]
        dry_run: bool,

        /// Re-fetch the schema after committing and compare
        #[arg(long)]
        verify: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show resolved configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn run_command(cli: Cli) -> Result<()> {
    let (config_path, config) =
        cli::config::resolve(cli.config.as_deref()).context("Failed to load configuration")?;
    debug!(path = %config_path.display(), base_url = %config.api.base_url, "configuration resolved");

    if let Commands::Config { json } = cli.command {
        return cli::config::run(cli::config::ConfigArgs { json }, &config_path, &config);
    }

    let service = config.connect().context("Failed to create HTTP client")?;
    let base_url = config.api.base_url.as_str();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        match cli.command {
            Commands::Show { event, json } => {
                cli::show::run(cli::show::ShowArgs { event, json }, &service, base_url).await
            }
            Commands::Types { json } => {
                cli::types::run(cli::types::TypesArgs { json }, &service, base_url).await
            }
            Commands::Edit {
                event,
                plan,
                dry_run,
                verify,
                json,
            } => {
                let args = cli::edit::EditArgs {
                    event,
                    plan,
                    dry_run,
                    verify,
                    json,
                };
                cli::edit::run(args, &service, base_url).await
            }
            Commands::Config { .. } => Ok(()),
        }
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        app_name: "blueprint",
        verbose: cli.verbose,
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", err);
            ExitCode::from(1)
        }
    }
}
