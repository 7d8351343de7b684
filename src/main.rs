mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use linemark::config::LinemarkConfig;

#[derive(Parser)]
#[command(name = "linemark", version, about = "Line bookmarks with notes, scoped per project and branch")]
struct Cli {
    /// Config file (default: ~/.config/linemark/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List bookmarks in the current project scope
    List {
        /// Only bookmarks in this file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Bookmark a line, optionally with a note
    Add {
        file: PathBuf,
        line: u32,
        #[arg(long)]
        note: Option<String>,
    },
    /// Delete a bookmark by id
    Delete { id: String },
    /// Delete all bookmarks in the scope, or in one file
    Clear {
        #[arg(long)]
        file: Option<PathBuf>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show the active scope and its storage file
    Scope,
    /// Dump the scope's bookmarks as JSON to stdout
    Export,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LinemarkConfig::load_from(path)?,
        None => LinemarkConfig::load()?,
    };

    // Log to stderr so stdout stays clean for JSON output.
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::List { file, json } => cli::list::list(&config, file.as_deref(), json)?,
        Command::Add { file, line, note } => cli::add::add(&config, &file, line, note.as_deref())?,
        Command::Delete { id } => cli::delete::delete(&config, &id)?,
        Command::Clear { file, yes } => cli::delete::clear(&config, file.as_deref(), yes)?,
        Command::Scope => cli::scope::scope(&config)?,
        Command::Export => cli::export::export(&config)?,
    }

    Ok(())
}
