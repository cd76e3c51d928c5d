//! CLI module for the MindShift coaching assistant.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Retrieval-augmented coaching assistant for reframing limiting beliefs.
#[derive(Debug, Parser)]
#[command(name = "mindshift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the knowledge base from a documents directory (full rebuild)
    Ingest(commands::IngestArgs),

    /// Get a coaching reply for one limiting belief
    Ask(commands::AskArgs),

    /// Interactive coaching session
    Chat(commands::ChatArgs),

    /// Show the chunks retrieved for a query, without generating a reply
    Search(commands::SearchArgs),

    /// Show knowledge base statistics
    Status,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

// FromStr is implemented in models::search

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ingest_overrides() {
        let cli = Cli::try_parse_from([
            "mindshift",
            "ingest",
            "docs",
            "--chunk-size",
            "500",
            "--chunk-overlap",
            "50",
            "--collection",
            "test",
        ])
        .unwrap();
        match cli.command {
            Commands::Ingest(args) => {
                assert_eq!(args.dir.unwrap().to_str(), Some("docs"));
                assert_eq!(args.chunk_size, Some(500));
                assert_eq!(args.chunk_overlap, Some(50));
                assert_eq!(args.collection.as_deref(), Some("test"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_ask_with_global_format() {
        let cli = Cli::try_parse_from([
            "mindshift",
            "ask",
            "I am not good enough",
            "-k",
            "3",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.belief, "I am not good enough");
                assert_eq!(args.top_k, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
