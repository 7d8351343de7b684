//! CLI `delete` and `clear` commands.

use anyhow::{bail, Result};
use std::io::Write;
use std::path::Path;

use linemark::config::LinemarkConfig;
use linemark::ClearOutcome;

/// Delete a single bookmark by id.
pub fn delete(config: &LinemarkConfig, id: &str) -> Result<()> {
    let mut engine = super::open_engine(config)?;
    let removed = engine.delete_by_id(id)?;
    println!("Deleted {} ({}:{})", removed.id, removed.file, removed.line);
    Ok(())
}

/// Delete all bookmarks in the scope, or in one file, after user confirmation.
pub fn clear(config: &LinemarkConfig, file: Option<&Path>, yes: bool) -> Result<()> {
    let mut engine = super::open_engine(config)?;

    if let Some(file) = file {
        let path = super::resolve_path(file)?;
        let count = engine.delete_for_file(&path.to_string_lossy())?;
        println!("Deleted {count} bookmarks in {}", path.display());
        return Ok(());
    }

    if !engine.has_bookmarks() {
        println!("No bookmarks in {}.", engine.scope());
        return Ok(());
    }

    if !yes {
        println!("WARNING: This will delete ALL bookmarks for {}.", engine.scope());
        println!("Storage: {}", engine.storage_path().display());
        print!("\nType YES to confirm: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if input.trim() != "YES" {
            bail!("clear cancelled");
        }
    }

    engine.host_mut().push_confirm_answer(true);
    match engine.clear_all()? {
        ClearOutcome::Cleared(count) => println!("Deleted {count} bookmarks."),
        ClearOutcome::NothingToClear => println!("No bookmarks to delete."),
        ClearOutcome::Declined => println!("Nothing deleted."),
    }
    Ok(())
}
