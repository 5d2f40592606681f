use anteml::{ParseError, Parser as Renderer, ParserOptions};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::cell::RefCell;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

mod config;

#[derive(Parser)]
#[command(
    name = "anteml",
    version,
    about = "Render AnTeML terminal markup to ANSI escape sequences"
)]
struct Cli {
    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log every dispatched event (same as RUST_LOG=debug)
    #[arg(long, global = true)]
    verbose: bool,

    /// Options file (default: ./anteml.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every command that runs the parser.
#[derive(clap::Args)]
struct OptionFlags {
    /// Drop unknown tags, entities and declarations
    #[arg(long)]
    strip_unknown: bool,

    /// Drop comments
    #[arg(long)]
    strip_comments: bool,

    /// Pass whitespace through untouched
    #[arg(long)]
    keep_whitespace: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markup file (or stdin) to stdout
    Render {
        /// Path to the markup file; reads stdin when omitted or "-"
        file: Option<String>,

        #[command(flatten)]
        flags: OptionFlags,

        /// Feed the document in chunks of this many bytes
        #[arg(long, value_parser = clap::value_parser!(usize))]
        chunk_size: Option<usize>,
    },

    /// Check markup file(s) for invalid markup
    Check {
        /// Path to the markup file(s)
        #[arg(required = true)]
        files: Vec<String>,

        #[command(flatten)]
        flags: OptionFlags,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir()?;
    let base = config::load_options(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Render {
            file,
            flags,
            chunk_size,
        } => {
            let options = apply_flags(base, &flags);
            handle_render(file.as_deref(), options, chunk_size)?;
        }
        Commands::Check { files, flags } => {
            let options = apply_flags(base, &flags);
            handle_check(&files, &options, cli.quiet)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

/// Command-line flags only ever switch options on; the file provides the rest.
fn apply_flags(mut options: ParserOptions, flags: &OptionFlags) -> ParserOptions {
    if flags.strip_unknown {
        options.strip_unknown = true;
    }
    if flags.strip_comments {
        options.strip_comments = true;
    }
    if flags.keep_whitespace {
        options.strip_whitespace = false;
    }
    options
}

fn read_source(file: Option<&str>) -> Result<String> {
    match file {
        None | Some("-") => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read stdin")?;
            Ok(content)
        }
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read '{}': {}", path, e)),
    }
}

/// Split `source` into pieces of roughly `size` bytes on char boundaries.
fn chunks(source: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut pieces = Vec::new();
    let mut start = 0;
    while start < source.len() {
        let mut end = (start + size).min(source.len());
        while !source.is_char_boundary(end) {
            end += 1;
        }
        pieces.push(&source[start..end]);
        start = end;
    }
    pieces
}

fn handle_render(file: Option<&str>, options: ParserOptions, chunk_size: Option<usize>) -> Result<()> {
    let source = read_source(file)?;
    let name = file.unwrap_or("-");

    let pending = Rc::new(RefCell::new(String::new()));
    let sink = Rc::clone(&pending);
    let mut parser = Renderer::new(
        move |fragment: &str| sink.borrow_mut().push_str(fragment),
        options,
    );

    let pieces = match chunk_size {
        Some(size) => chunks(&source, size),
        None => vec![source.as_str()],
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for piece in pieces {
        let fed = parser.feed(piece);
        flush(&pending, &mut out)?;
        fed.map_err(|e| anyhow::anyhow!("{}: {}", name, e))?;
    }
    let closed = parser.close();
    flush(&pending, &mut out)?;
    closed.map_err(|e| anyhow::anyhow!("{}: {}", name, e))?;
    Ok(())
}

fn flush(pending: &RefCell<String>, out: &mut impl Write) -> Result<()> {
    let text = pending.take();
    if !text.is_empty() {
        out.write_all(text.as_bytes())?;
        out.flush()?;
    }
    Ok(())
}

fn check_source(source: &str, options: &ParserOptions) -> Result<(), ParseError> {
    let mut parser = Renderer::new(|_: &str| {}, options.clone());
    parser.feed(source)?;
    parser.close()
}

fn handle_check(files: &[String], options: &ParserOptions, quiet: bool) -> Result<()> {
    let mut has_errors = false;

    for file in files {
        let content = std::fs::read_to_string(Path::new(file))
            .map_err(|e| anyhow::anyhow!("Failed to read '{}': {}", file, e))?;

        match check_source(&content, options) {
            Ok(()) => {
                if !quiet {
                    println!("{}: {}", file, "OK".green());
                }
            }
            Err(err) => {
                has_errors = true;
                println!("{}: {}: {}", file, "error".red().bold(), err);
            }
        }
    }

    if has_errors {
        std::process::exit(1);
    }

    Ok(())
}
