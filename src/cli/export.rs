use anyhow::Result;
use serde::Serialize;

use linemark::config::LinemarkConfig;
use linemark::persistence::FORMAT_VERSION;
use linemark::Bookmark;

/// Export format: the storage envelope plus the scope it came from.
#[derive(Debug, Serialize)]
struct ExportData {
    version: u64,
    root: String,
    branch: String,
    bookmarks: Vec<Bookmark>,
}

/// Export the scope's bookmarks as JSON to stdout.
pub fn export(config: &LinemarkConfig) -> Result<()> {
    let mut engine = super::open_engine(config)?;
    let scope = engine.scope().clone();

    let data = ExportData {
        version: FORMAT_VERSION,
        root: scope.root.to_string_lossy().into_owned(),
        branch: scope.branch,
        bookmarks: engine.get_all(),
    };

    let json = serde_json::to_string_pretty(&data)?;
    println!("{json}");

    eprintln!("Exported {} bookmarks.", data.bookmarks.len());
    Ok(())
}
