//! php-web - PHP app build CLI
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use php_web::cli::{Cli, Commands};
use php_web::error::PhpWebResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> PhpWebResult<ExitCode> {
    let cli = Cli::parse();

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("php_web=warn"),
        1 => EnvFilter::new("php_web=info"),
        _ => EnvFilter::new("php_web=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Detect(args) => php_web::cli::commands::detect(args).await,
        Commands::Build(args) => php_web::cli::commands::build(args).await,
    }
}
