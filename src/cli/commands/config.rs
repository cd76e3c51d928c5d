use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::{Formatter, get_formatter};
use crate::models::{Config, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Initialize configuration file")]
    Init {
        #[arg(
            long,
            short = 'g',
            help = "Create global config instead of project config"
        )]
        global: bool,
        #[arg(long, help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Show configuration file paths")]
    Path {
        #[arg(long, help = "Show all possible config paths")]
        all: bool,
    },
}

pub async fn handle_config(
    cmd: ConfigCommand,
    config: &Config,
    format: OutputFormat,
    _verbose: bool,
) -> Result<()> {
    let formatter = get_formatter(format);

    match cmd {
        ConfigCommand::Init { global, force } => handle_init(global, force, formatter.as_ref()),
        ConfigCommand::Show => handle_show(config, format),
        ConfigCommand::Path { all } => handle_path(all),
    }
}

fn handle_init(global: bool, force: bool, formatter: &dyn Formatter) -> Result<()> {
    let config_path = if global {
        Config::global_path()
            .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?
    } else {
        Config::project_path()
    };

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    Config::default()
        .save(&config_path)
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    print!(
        "{}",
        formatter.format_message(&format!("Created config at: {}", config_path.display()))
    );
    Ok(())
}

fn handle_show(config: &Config, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let output = serde_json::json!({
            "config": config,
            "config_path": Config::config_path(),
            "api_key_set": config.require_api_key().is_ok(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match Config::config_path() {
        Some(path) => println!("# Loaded from: {}", path.display()),
        None => println!("# No config file found; using defaults"),
    }
    let api_key = if config.require_api_key().is_ok() {
        "set"
    } else {
        "NOT SET"
    };
    println!("# OPENAI_API_KEY: {api_key}");
    println!();

    let rendered = toml::to_string_pretty(config).context("failed to render config")?;
    print!("{rendered}");

    Ok(())
}

fn handle_path(show_all: bool) -> Result<()> {
    let project_path = Config::project_path();
    let global_path = Config::global_path();

    println!("Configuration paths:");
    println!();

    if project_path.exists() {
        println!("Project config (active): {}", project_path.display());
    } else if show_all {
        println!("Project config (would be): {}", project_path.display());
    }

    if let Some(ref path) = global_path {
        if path.exists() {
            let active = if project_path.exists() {
                "shadowed"
            } else {
                "active"
            };
            println!("Global config ({active}): {}", path.display());
        } else if show_all {
            println!("Global config (would be): {}", path.display());
        }
    }

    if show_all && let Ok(cwd) = std::env::current_dir() {
        let env_path = cwd.join(".env");
        if env_path.exists() {
            println!(".env file (active): {}", env_path.display());
        } else {
            println!(".env file (would be): {}", env_path.display());
        }
    }

    Ok(())
}
