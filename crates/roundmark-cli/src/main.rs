//! Roundmark CLI - Parse, check, and re-render roundmark documents
//!
//! Usage:
//!   rmark [OPTIONS] <COMMAND> <FILE>
//!
//! Commands:
//!   parse   Parse and display document entities
//!   check   Verify the document serializes back to itself
//!   render  Re-render the document into another file
//!   stats   Show entity counts

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use roundmark_core::{Entity, EntityKind, Error, ListMarker, ParseErrors, RenderMode, RoundTrip};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "rmark")]
#[command(version)]
#[command(about = "Lossless Markdown parser and round-trip checker", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Line separator (escapes \n, \r\n and \t are understood)
    #[arg(
        long,
        global = true,
        env = "RMARK_SEPARATOR",
        default_value = "\\n",
        value_parser = parse_separator
    )]
    separator: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and display document entities
    Parse {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Show every entity with its inline spans
        #[arg(short, long)]
        tree: bool,

        /// Output entities as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Verify the document serializes back to exactly itself
    Check {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Where to write the reconstruction when it differs
        #[arg(short, long, value_name = "FILE", default_value = "output.md")]
        output: PathBuf,
    },

    /// Re-render the document, refusing to write a lossy result
    Render {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// How list items and paragraphs are rendered
        #[arg(long, value_enum, default_value = "flat")]
        mode: Mode,
    },

    /// Show entity counts
    Stats {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Write the stored line content
    Flat,
    /// Rebuild the content from inline spans
    Spans,
}

impl From<Mode> for RenderMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Flat => RenderMode::Flat,
            Mode::Spans => RenderMode::Spans,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let rt = RoundTrip::new().with_separator(&cli.separator);

    match cli.command {
        Commands::Parse { input, tree, json } => {
            let text = read_document(&input)?;
            cmd_parse(&rt, &text, tree, json)
        }
        Commands::Check { input, output } => {
            let text = read_document(&input)?;
            cmd_check(&rt, &text, &output)
        }
        Commands::Render {
            input,
            output,
            mode,
        } => {
            let text = read_document(&input)?;
            cmd_render(&rt.with_mode(mode.into()), &text, &output)
        }
        Commands::Stats { input } => {
            let text = read_document(&input)?;
            cmd_stats(&rt, &text)
        }
    }
}

fn parse_separator(raw: &str) -> std::result::Result<String, String> {
    let separator = raw
        .replace("\\r", "\r")
        .replace("\\n", "\n")
        .replace("\\t", "\t");
    if separator.is_empty() {
        return Err("separator must not be empty".to_string());
    }
    Ok(separator)
}

/// Read a document, treating a missing file as an empty one.
fn read_document(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("'{}' not found, using an empty document", path.display());
            Ok(String::new())
        }
        Err(e) => Err(e).with_context(|| format!("failed to read '{}'", path.display())),
    }
}

fn write_document(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("failed to write '{}'", path.display()))
}

// =============================================================================
// Parse Command
// =============================================================================

fn cmd_parse(rt: &RoundTrip, text: &str, tree: bool, json: bool) -> Result<()> {
    let result = rt.parser().parse_str(text)?;

    for error in result.errors.iter() {
        eprintln!("warning: {}", error);
    }

    if json {
        let doc = JsonDocument {
            entities: result.entities.iter().map(convert_entity).collect(),
            errors: convert_errors(&result.errors),
        };
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else if tree {
        print_tree(&result.entities);
    } else {
        print_summary(&result.entities);
    }

    Ok(())
}

// =============================================================================
// Check Command
// =============================================================================

fn cmd_check(rt: &RoundTrip, text: &str, output: &Path) -> Result<()> {
    match rt.check(text) {
        Ok(report) => {
            println!(
                "OK: {} entities, {} bytes round-trip exactly",
                report.entities.len(),
                text.len()
            );
            Ok(())
        }
        Err(Error::RoundTripMismatch(mismatch)) => {
            write_document(output, &mismatch.reconstructed)?;
            eprintln!("Mismatch at line {}, column {}", mismatch.line, mismatch.column);
            eprintln!(
                "  original:      {}",
                nth_line(&mismatch.original, mismatch.line)
            );
            eprintln!(
                "  reconstructed: {}",
                nth_line(&mismatch.reconstructed, mismatch.line)
            );
            bail!(
                "round-trip mismatch, reconstruction written to '{}'",
                output.display()
            )
        }
        Err(e) => Err(e.into()),
    }
}

/// Mismatch positions count `\n`-terminated lines.
fn nth_line(text: &str, line: usize) -> &str {
    text.split('\n').nth(line.saturating_sub(1)).unwrap_or("")
}

// =============================================================================
// Render Command
// =============================================================================

fn cmd_render(rt: &RoundTrip, text: &str, output: &Path) -> Result<()> {
    let report = rt
        .check(text)
        .with_context(|| format!("refusing to write '{}'", output.display()))?;

    write_document(output, &report.reconstructed)?;
    println!(
        "Wrote {} entities to '{}'",
        report.entities.len(),
        output.display()
    );
    Ok(())
}

// =============================================================================
// Stats Command
// =============================================================================

const KINDS: [EntityKind; 12] = [
    EntityKind::Title,
    EntityKind::Paragraph,
    EntityKind::UnorderedListItem,
    EntityKind::OrderedListItem,
    EntityKind::CodeBlock,
    EntityKind::DisplayMath,
    EntityKind::Link,
    EntityKind::Image,
    EntityKind::EmptyLine,
    EntityKind::Text,
    EntityKind::InlineMath,
    EntityKind::InlineLink,
];

fn cmd_stats(rt: &RoundTrip, text: &str) -> Result<()> {
    let result = rt.parser().parse_str(text)?;

    let mut counts = [0usize; KINDS.len()];
    let mut spans = 0;
    for entity in &result.entities {
        count_kind(&mut counts, entity.kind());
        for child in entity.children() {
            spans += 1;
            count_kind(&mut counts, child.kind());
        }
    }

    println!("Document Statistics");
    println!("-------------------");
    println!("Entities:       {}", result.entities.len());
    println!("Inline spans:   {}", spans);
    println!();
    println!("By kind:");
    for (kind, count) in KINDS.iter().zip(counts) {
        if count > 0 {
            println!("  {:<18}{}", format!("{}:", kind), count);
        }
    }
    println!();
    println!("Size:");
    println!("  Bytes:          {}", text.len());
    println!("  Lines:          {}", text.split(rt.parser().separator()).count());
    println!();
    println!("Errors:         {}", result.errors.len());

    Ok(())
}

fn count_kind(counts: &mut [usize], kind: EntityKind) {
    if let Some(i) = KINDS.iter().position(|k| *k == kind) {
        counts[i] += 1;
    }
}

// =============================================================================
// JSON Output
// =============================================================================

#[derive(Serialize)]
struct JsonDocument<'a> {
    entities: Vec<JsonEntity<'a>>,
    errors: Vec<JsonError<'a>>,
}

#[derive(Serialize)]
struct JsonError<'a> {
    message: &'a str,
    line: Option<usize>,
    kind: String,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum JsonEntity<'a> {
    Title {
        level: usize,
        content: &'a str,
    },
    CodeBlock {
        language: &'a str,
        fence: &'static str,
        content: &'a str,
    },
    Link {
        content: &'a str,
        url: &'a str,
    },
    Image {
        content: &'a str,
        url: &'a str,
    },
    EmptyLine {
        content: &'a str,
    },
    Text {
        content: &'a str,
    },
    DisplayMath {
        content: &'a str,
    },
    InlineMath {
        content: &'a str,
    },
    InlineLink {
        content: &'a str,
        url: &'a str,
    },
    ListItem {
        level: usize,
        indent: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        bullet: Option<char>,
        #[serde(skip_serializing_if = "Option::is_none")]
        index: Option<u64>,
        content: &'a str,
        children: Vec<JsonEntity<'a>>,
    },
    Paragraph {
        content: &'a str,
        children: Vec<JsonEntity<'a>>,
    },
}

fn convert_errors(errors: &ParseErrors) -> Vec<JsonError<'_>> {
    errors
        .iter()
        .map(|e| JsonError {
            message: &e.message,
            line: e.line,
            kind: format!("{:?}", e.kind),
        })
        .collect()
}

fn convert_entity<'a>(entity: &'a Entity) -> JsonEntity<'a> {
    match entity {
        Entity::Title(t) => JsonEntity::Title {
            level: t.level,
            content: &t.content,
        },
        Entity::CodeBlock(c) => JsonEntity::CodeBlock {
            language: &c.language,
            fence: c.fence.as_str(),
            content: &c.content,
        },
        Entity::Link(l) => JsonEntity::Link {
            content: &l.content,
            url: &l.url,
        },
        Entity::Image(l) => JsonEntity::Image {
            content: &l.content,
            url: &l.url,
        },
        Entity::EmptyLine(t) => JsonEntity::EmptyLine {
            content: &t.content,
        },
        Entity::Text(t) => JsonEntity::Text {
            content: &t.content,
        },
        Entity::DisplayMath(m) => JsonEntity::DisplayMath {
            content: &m.content,
        },
        Entity::InlineMath(m) => JsonEntity::InlineMath {
            content: &m.content,
        },
        Entity::InlineLink(l) => JsonEntity::InlineLink {
            content: &l.content,
            url: &l.url,
        },
        Entity::ListItem(item) => {
            let (bullet, index) = match item.marker {
                ListMarker::Bullet(b) => (Some(b), None),
                ListMarker::Ordered(n) => (None, Some(n)),
            };
            JsonEntity::ListItem {
                level: item.level,
                indent: item.indent,
                bullet,
                index,
                content: &item.content,
                children: item.children.iter().map(convert_entity).collect(),
            }
        }
        Entity::Paragraph(p) => JsonEntity::Paragraph {
            content: &p.content,
            children: p.children.iter().map(convert_entity).collect(),
        },
    }
}

// =============================================================================
// Text Output
// =============================================================================

fn print_summary(entities: &[Entity]) {
    println!("Entities: {}", entities.len());
    for (i, entity) in entities.iter().enumerate() {
        println!("  [{}] {}", i + 1, describe_entity(entity));
    }
}

fn print_tree(entities: &[Entity]) {
    println!("=== Roundmark Entities ===");
    for (i, entity) in entities.iter().enumerate() {
        println!();
        println!("[{}] {}", i + 1, describe_entity(entity));
        print_entity_verbose(entity, 1);
    }
}

fn describe_entity(entity: &Entity) -> String {
    match entity {
        Entity::Title(t) => format!("Title (level {})", t.level),
        Entity::CodeBlock(c) if c.language.is_empty() => format!("CodeBlock ({})", c.fence),
        Entity::CodeBlock(c) => format!("CodeBlock ({}, lang: {})", c.fence, c.language),
        Entity::Link(l) => format!("Link (url: {})", l.url),
        Entity::Image(l) => format!("Image (src: {})", l.url),
        Entity::ListItem(item) => match item.marker {
            ListMarker::Bullet(b) => format!("ListItem ('{}', level {})", b, item.level),
            ListMarker::Ordered(n) => format!("ListItem ({}., level {})", n, item.level),
        },
        Entity::Paragraph(p) => format!("Paragraph ({} spans)", p.children.len()),
        other => other.kind().to_string(),
    }
}

fn print_entity_verbose(entity: &Entity, indent: usize) {
    let prefix = "  ".repeat(indent);

    if matches!(entity, Entity::EmptyLine(_)) {
        return;
    }

    let content = entity.content();
    let preview: String = content.chars().take(60).collect();
    let ellipsis = if content.chars().count() > 60 { "..." } else { "" };
    println!(
        "{}Content: {}{}",
        prefix,
        preview.replace('\n', "\\n"),
        ellipsis
    );

    for child in entity.children() {
        println!("{}- {}", prefix, describe_entity(child));
        print_entity_verbose(child, indent + 2);
    }
}
