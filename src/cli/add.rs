//! CLI `add` command: bookmark a line, or set the note of an existing bookmark.

use anyhow::{bail, Result};
use std::path::Path;

use linemark::config::LinemarkConfig;
use linemark::host::DocumentAnchorProvider;
use linemark::{AnnotateOutcome, ToggleOutcome};

pub fn add(config: &LinemarkConfig, file: &Path, line: u32, note: Option<&str>) -> Result<()> {
    let path = super::resolve_path(file)?;
    let mut engine = super::open_engine(config)?;
    let doc = super::open_document(&mut engine, &path)?;

    let line_count = engine.host().line_count(doc).unwrap_or(0);
    if line == 0 || line > line_count {
        bail!("line {line} is out of range ({} has {line_count} lines)", path.display());
    }
    engine.host_mut().set_cursor(doc, line);

    match note {
        Some(note) => match engine.annotate(Some(note))? {
            AnnotateOutcome::Created { id } => println!("Created {id} at {}:{line}", path.display()),
            AnnotateOutcome::Updated { id } => println!("Updated note of {id}"),
            AnnotateOutcome::Cancelled => println!("Empty note, nothing changed."),
        },
        None => {
            let path_str = path.to_string_lossy();
            if let Some(existing) = engine
                .bookmarks_for_file(&path_str)
                .into_iter()
                .find(|b| b.line == line)
            {
                println!("Already bookmarked as {}", existing.id);
                return Ok(());
            }
            if let ToggleOutcome::Added { id } = engine.toggle()? {
                println!("Created {id} at {}:{line}", path.display());
            }
        }
    }

    Ok(())
}
