use anyhow::Result;
use clap::Args;

use super::{build_coach, resolve_top_k};
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Args)]
pub struct AskArgs {
    #[arg(required = true, help = "The limiting belief to work on")]
    pub belief: String,

    #[arg(long, short = 'k', help = "Number of knowledge-base chunks to retrieve")]
    pub top_k: Option<usize>,
}

pub async fn handle_ask(
    args: AskArgs,
    config: &Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let top_k = resolve_top_k(config, args.top_k)?;
    let coach = build_coach(config, top_k).await?;
    let formatter = get_formatter(format);

    if verbose {
        eprintln!("Belief: \"{}\"", args.belief);
        eprintln!("  Top-k: {top_k}");
        eprintln!("  Model: {}", config.openai.completion_model);
    }

    let reply = coach.respond_detailed(&args.belief).await;
    print!("{}", formatter.format_reply(&reply));

    Ok(())
}
