mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check_config, normalize, run, CheckConfigArgs, NormalizeArgs, RunArgs};

/// Scribe CLI - run editing commands over markup fixtures
#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply commands to a fixture and print the result
    Run(RunArgs),

    /// Print a fixture after normalization
    Normalize(NormalizeArgs),

    /// Validate a config file
    CheckConfig(CheckConfigArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Run(args) => run(args, &cwd),
            Command::Normalize(args) => normalize(args, &cwd),
            Command::CheckConfig(args) => check_config(args),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
