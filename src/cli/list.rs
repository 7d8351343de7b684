use anyhow::Result;
use std::path::Path;

use linemark::config::LinemarkConfig;
use linemark::Bookmark;

/// Print bookmarks grouped by file, in line order.
pub fn list(config: &LinemarkConfig, file: Option<&Path>, json: bool) -> Result<()> {
    let mut engine = super::open_engine(config)?;

    let bookmarks: Vec<Bookmark> = match file {
        Some(file) => {
            let path = super::resolve_path(file)?;
            engine.bookmarks_for_file(&path.to_string_lossy())
        }
        None => {
            let mut all = engine.get_all();
            all.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
            all
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&bookmarks)?);
        return Ok(());
    }

    if bookmarks.is_empty() {
        println!("No bookmarks in {}.", engine.scope());
        return Ok(());
    }

    let mut current_file: Option<&str> = None;
    for bookmark in &bookmarks {
        if current_file != Some(bookmark.file.as_str()) {
            println!("{}", bookmark.file);
            current_file = Some(bookmark.file.as_str());
        }
        match &bookmark.note {
            Some(note) => println!("  {:>5}  {}  {}", bookmark.line, bookmark.id, note),
            None => println!("  {:>5}  {}", bookmark.line, bookmark.id),
        }
    }
    Ok(())
}
