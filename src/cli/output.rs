use std::fmt::Write as FmtWrite;

use serde::Serialize;

use crate::models::{CoachReply, OutputFormat, SearchResults};
use crate::services::{CollectionStats, IngestReport};

const PREVIEW_CHARS: usize = 200;

pub trait Formatter {
    fn format_search_results(&self, results: &SearchResults) -> String;
    fn format_reply(&self, reply: &CoachReply) -> String;
    fn format_ingest_report(&self, report: &IngestReport) -> String;
    fn format_status(&self, stats: &CollectionStats) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

fn preview(content: &str) -> String {
    let head: String = content.chars().take(PREVIEW_CHARS).collect();
    if content.chars().count() > PREVIEW_CHARS {
        format!("{}...", head)
    } else {
        head
    }
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("No results found for: {}\n", results.query);
        }

        let mut output = String::new();
        let _ = writeln!(output, "Search results for: \"{}\"", results.query);
        let _ = writeln!(
            output,
            "Found {} results in {}ms\n",
            results.len(),
            results.duration_ms
        );

        for (i, result) in results.results.iter().enumerate() {
            let _ = writeln!(output, "{}. [Score: {:.3}]", i + 1, result.score);
            let _ = writeln!(output, "   Location: {}", result.location());
            let _ = writeln!(output, "   ---");
            for line in preview(&result.content).lines() {
                let _ = writeln!(output, "   {}", line);
            }
            let _ = writeln!(output);
        }

        output
    }

    fn format_reply(&self, reply: &CoachReply) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "{}", reply.reply.trim_end());
        if !reply.sources.is_empty() {
            let _ = writeln!(output, "\nSources: {}", reply.sources.join(", "));
        }
        output
    }

    fn format_ingest_report(&self, report: &IngestReport) -> String {
        let stats = &report.chunk_stats;
        let mut output = String::new();
        let _ = writeln!(output, "Ingestion Complete");
        let _ = writeln!(output, "------------------");
        let _ = writeln!(output, "Collection:       {}", report.collection);
        let _ = writeln!(output, "Documents dir:    {}", report.documents_dir.display());
        let _ = writeln!(output, "Documents loaded: {}", report.documents_loaded);
        let _ = writeln!(output, "Files skipped:    {}", report.files_skipped);
        let _ = writeln!(output, "Chunks created:   {}", report.chunks_created);
        let _ = writeln!(
            output,
            "Chunk length:     avg {:.1}, min {}, max {}",
            stats.avg_chars, stats.min_chars, stats.max_chars
        );
        let _ = writeln!(output, "Stored records:   {}", report.collection_count);
        let _ = writeln!(output, "Duration:         {}ms", report.duration_ms);
        output
    }

    fn format_status(&self, stats: &CollectionStats) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "Status");
        let _ = writeln!(output, "------");

        let state = if stats.exists { "[READY]" } else { "[NOT BUILT]" };
        let _ = writeln!(output, "Collection:      {} {}", stats.collection, state);
        let _ = writeln!(
            output,
            "  Persist dir:   {}",
            stats.persist_directory.display()
        );
        let _ = writeln!(output, "  Chunks:        {}", stats.total_chunks);
        if let Some(dim) = stats.dimension {
            let _ = writeln!(output, "  Dimension:     {}", dim);
        }
        if let Some(ref created) = stats.created_at {
            let _ = writeln!(output, "  Created:       {}", created);
        }
        let _ = writeln!(output);
        let _ = writeln!(output, "Embedding model: {}", stats.embedding_model);
        let _ = writeln!(output, "Chunk size:      {}", stats.chunk_size);
        let _ = writeln!(output, "Chunk overlap:   {}", stats.chunk_overlap);
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        let mut output =
            rendered.unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string());
        output.push('\n');
        output
    }
}

impl Formatter for JsonFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        self.render(results)
    }

    fn format_reply(&self, reply: &CoachReply) -> String {
        self.render(reply)
    }

    fn format_ingest_report(&self, report: &IngestReport) -> String {
        self.render(report)
    }

    fn format_status(&self, stats: &CollectionStats) -> String {
        self.render(stats)
    }

    fn format_message(&self, message: &str) -> String {
        self.render(&serde_json::json!({ "message": message }))
    }

    fn format_error(&self, error: &str) -> String {
        self.render(&serde_json::json!({ "error": error }))
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("## No results found\n\nQuery: `{}`\n", results.query);
        }

        let mut output = String::new();
        let _ = writeln!(output, "## Search Results\n");
        let _ = writeln!(output, "**Query:** `{}`\n", results.query);
        let _ = writeln!(
            output,
            "Found {} results in {}ms\n",
            results.len(),
            results.duration_ms
        );

        for (i, result) in results.results.iter().enumerate() {
            let _ = writeln!(output, "### {}. Score: {:.3}\n", i + 1, result.score);
            let _ = writeln!(output, "**Location:** `{}`\n", result.location());
            let _ = writeln!(output, "```");
            let _ = writeln!(output, "{}", result.content);
            let _ = writeln!(output, "```\n");
        }

        output
    }

    fn format_reply(&self, reply: &CoachReply) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "> {}\n", reply.belief);
        let _ = writeln!(output, "{}\n", reply.reply.trim_end());
        if !reply.sources.is_empty() {
            let sources: Vec<String> = reply.sources.iter().map(|s| format!("`{}`", s)).collect();
            let _ = writeln!(output, "**Sources:** {}", sources.join(", "));
        }
        output
    }

    fn format_ingest_report(&self, report: &IngestReport) -> String {
        let stats = &report.chunk_stats;
        let mut output = String::new();
        let _ = writeln!(output, "## Ingestion Complete\n");
        let _ = writeln!(output, "| Metric | Value |");
        let _ = writeln!(output, "|--------|-------|");
        let _ = writeln!(output, "| Collection | `{}` |", report.collection);
        let _ = writeln!(output, "| Documents loaded | {} |", report.documents_loaded);
        let _ = writeln!(output, "| Files skipped | {} |", report.files_skipped);
        let _ = writeln!(output, "| Chunks created | {} |", report.chunks_created);
        let _ = writeln!(output, "| Avg chunk length | {:.1} |", stats.avg_chars);
        let _ = writeln!(output, "| Min chunk length | {} |", stats.min_chars);
        let _ = writeln!(output, "| Max chunk length | {} |", stats.max_chars);
        let _ = writeln!(output, "| Stored records | {} |", report.collection_count);
        let _ = writeln!(output, "| Duration | {}ms |", report.duration_ms);
        output
    }

    fn format_status(&self, stats: &CollectionStats) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "## Status\n");

        let state = if stats.exists { "✅" } else { "❌" };
        let _ = writeln!(output, "### Collection `{}` {}\n", stats.collection, state);
        let _ = writeln!(
            output,
            "- **Persist dir:** `{}`",
            stats.persist_directory.display()
        );
        let _ = writeln!(output, "- **Chunks:** {}", stats.total_chunks);
        if let Some(dim) = stats.dimension {
            let _ = writeln!(output, "- **Dimension:** {}", dim);
        }
        let _ = writeln!(output, "- **Embedding model:** {}", stats.embedding_model);
        let _ = writeln!(output, "- **Chunk size:** {}", stats.chunk_size);
        let _ = writeln!(output, "- **Chunk overlap:** {}", stats.chunk_overlap);
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}
