//! CLI `scope` command: show which bookmark set is active and where it lives.

use anyhow::Result;

use linemark::config::LinemarkConfig;

pub fn scope(config: &LinemarkConfig) -> Result<()> {
    let mut engine = super::open_engine(config)?;
    let scope = engine.scope().clone();
    let path = engine.storage_path();

    println!("Linemark Scope");
    println!("==============");
    println!();
    println!("Root:              {}", scope.root.display());
    println!("Branch:            {}", scope.branch);
    println!("Key:               {}", scope.storage_key());
    println!("Storage:           {}", path.display());

    if !path.exists() {
        println!("Status:            no bookmarks saved yet");
        return Ok(());
    }

    let file_size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    let bookmarks = engine.get_all();
    let mut files: Vec<&str> = bookmarks.iter().map(|b| b.file.as_str()).collect();
    files.sort_unstable();
    files.dedup();
    let noted = bookmarks.iter().filter(|b| b.has_note()).count();

    println!("File size:         {}", format_bytes(file_size));
    println!();
    println!("Counts:");
    println!("  Bookmarks:       {}", bookmarks.len());
    println!("  With notes:      {noted}");
    println!("  Files:           {}", files.len());
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
