use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use mindshift::cli::commands::{
    handle_ask, handle_chat, handle_config, handle_ingest, handle_search, handle_status,
};
use mindshift::cli::{Cli, Commands};
use mindshift::models::{Config, OutputFormat};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "mindshift=debug" } else { "mindshift=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load().context("failed to load configuration")?;
    let format = cli.format.unwrap_or(config.retrieval.default_format);
    let verbose = cli.verbose;

    tokio::select! {
        result = run_command(cli.command, &config, format, verbose) => {
            result?;
        }
        _ = shutdown_signal() => {
            eprintln!("\nReceived shutdown signal, exiting...");
        }
    }

    Ok(())
}

async fn run_command(
    command: Commands,
    config: &Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    match command {
        Commands::Ingest(args) => {
            handle_ingest(args, config, format, verbose).await?;
        }
        Commands::Ask(args) => {
            handle_ask(args, config, format, verbose).await?;
        }
        Commands::Chat(args) => {
            handle_chat(args, config, format, verbose).await?;
        }
        Commands::Search(args) => {
            handle_search(args, config, format, verbose).await?;
        }
        Commands::Status => {
            handle_status(config, format, verbose).await?;
        }
        Commands::Config(cmd) => {
            handle_config(cmd, config, format, verbose).await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
