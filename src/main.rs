//! marklive - inspect how markdown becomes annotated text.
//!
//! # Usage
//!
//! ```bash
//! marklive README.md
//! marklive --json README.md
//! marklive --live --disable italic notes.md
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use marklive::config::{
    ConfigFlags, MarkdownConfig, ThemeMode, clear_config_flags, global_config_path,
    load_config_flags, local_override_path, parse_flag_tokens, save_config_flags,
};
use marklive::editor::{Buffer, ClickTarget, Editor, Span};
use marklive::highlight::SyntectHighlighter;
use marklive::live::{ListLive, StyleLive};
use marklive::perf;
use marklive::syntax::SyntaxEngine;

/// Render markdown into plain text plus annotation spans
#[derive(Parser, Debug)]
#[command(name = "marklive", version, about, long_about = None)]
struct Cli {
    /// Markdown file to annotate
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Print text, spans and click targets as JSON
    #[arg(long)]
    json: bool,

    /// Type the file into a live editor instead of batch parsing it
    #[arg(long)]
    live: bool,

    /// Extra rc file, read after the global and local ones
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Highlight theme background (light or dark)
    #[arg(long, value_enum)]
    theme: Option<ThemeMode>,

    /// Disable a syntax rule (repeatable)
    #[arg(long, value_name = "RULE")]
    disable: Vec<String>,

    /// Enable a syntax rule (repeatable)
    #[arg(long, value_name = "RULE")]
    enable: Vec<String>,

    /// Log timing scopes at debug level
    #[arg(long)]
    perf: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    text: String,
    spans: &'a [Span],
    click_targets: Vec<ClickTarget>,
}

fn batch(config: MarkdownConfig, source: &str) -> Buffer {
    let highlighter = SyntectHighlighter::new(config.theme, config.code_foreground);
    SyntaxEngine::new(config, Box::new(highlighter)).parse(source)
}

fn live(config: &MarkdownConfig, source: &str) -> Buffer {
    let _scope = perf::scope("live.type_document");
    let mut editor = Editor::from_text("")
        .with_listener(ListLive::new(config))
        .with_listener(StyleLive::new(config));
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    while let Some(&c) = chars.get(i) {
        let typed_at = editor.cursor();
        editor.type_text(c.encode_utf8(&mut [0u8; 4]));
        i += 1;
        // Keep an auto-continued list marker only if the source repeats it.
        let auto = typed_at + 1..editor.cursor();
        if auto.is_empty() {
            continue;
        }
        let inserted: Vec<char> = editor.buffer().slice(auto.clone()).chars().collect();
        if chars.get(i..i + inserted.len()) == Some(&inserted[..]) {
            i += inserted.len();
        } else {
            editor.delete(auto);
        }
    }
    editor.into_buffer()
}

fn print_table(buffer: &Buffer) {
    println!("{}", buffer.text());
    println!("---");
    let mut spans: Vec<&Span> = buffer.spans().iter().collect();
    spans.sort_by_key(|s| (s.start(), std::cmp::Reverse(s.end())));
    for span in spans {
        let text = buffer.slice(span.range());
        let inclusivity = format!("{:?}", span.inclusivity);
        println!(
            "{:>6}..{:<6} {inclusivity:<10} {:?} {:?}",
            span.start(),
            span.end(),
            span.annotation,
            text.trim_end_matches('\n')
        );
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let mut file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    if let Some(path) = &cli.config {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        file_flags = file_flags.union(&load_config_flags(path)?);
    }
    let effective = file_flags.union(&cli_flags);
    tracing::debug!(
        theme = ?cli.theme,
        enable = ?cli.enable,
        disable = ?cli.disable,
        "command line"
    );

    perf::set_enabled(effective.perf);
    let config = effective.resolve();

    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }
    let source = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;

    let buffer = if cli.live {
        live(&config, &source)
    } else {
        batch(config, &source)
    };

    if cli.json {
        let report = Report {
            text: buffer.text(),
            spans: buffer.spans(),
            click_targets: buffer.click_targets(),
        };
        let json = serde_json::to_string_pretty(&report).context("Failed to encode JSON")?;
        println!("{json}");
    } else {
        print_table(&buffer);
    }
    Ok(())
}
