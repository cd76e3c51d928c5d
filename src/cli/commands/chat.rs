//! Interactive coaching session.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::{build_coach, resolve_top_k};
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

const EXIT_WORDS: [&str; 3] = ["quit", "exit", "bye"];
const SEPARATOR_WIDTH: usize = 50;

#[derive(Debug, Args)]
pub struct ChatArgs {
    #[arg(long, short = 'k', help = "Number of knowledge-base chunks to retrieve")]
    pub top_k: Option<usize>,
}

fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    EXIT_WORDS.iter().any(|w| line.eq_ignore_ascii_case(w))
}

pub async fn handle_chat(
    args: ChatArgs,
    config: &Config,
    format: OutputFormat,
    _verbose: bool,
) -> Result<()> {
    let top_k = resolve_top_k(config, args.top_k)?;
    let coach = build_coach(config, top_k).await?;
    let formatter = get_formatter(format);
    let interactive = format == OutputFormat::Text;

    if interactive {
        println!("{}", style("MindShift coaching session").bold().cyan());
        println!("Share a limiting belief. Type 'quit', 'exit' or 'bye' to leave.\n");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        if interactive {
            stdout
                .write_all(format!("{} ", style("You:").bold().green()).as_bytes())
                .await?;
            stdout.flush().await?;
        }

        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };
        let belief = line.trim();
        if belief.is_empty() {
            continue;
        }
        if is_exit_command(belief) {
            if interactive {
                println!("Take care. Keep questioning the beliefs that limit you.");
            }
            break;
        }

        let reply = coach.respond_detailed(belief).await;
        if interactive {
            println!("\n{}", style("MindShift:").bold().magenta());
        }
        print!("{}", formatter.format_reply(&reply));
        if interactive {
            println!("{}", "-".repeat(SEPARATOR_WIDTH));
        }
    }

    Ok(())
}
