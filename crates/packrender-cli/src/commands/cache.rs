//! Cache command - inspect or empty the SQLite manifest cache

use console::style;
use packrender_repo::SqliteCache;
use std::path::Path;

use crate::error::Result;

fn open(path: Option<&Path>) -> Result<SqliteCache> {
    Ok(match path {
        Some(path) => SqliteCache::open_at(path)?,
        None => SqliteCache::open()?,
    })
}

pub fn stats(path: Option<&Path>) -> Result<()> {
    let cache = open(path)?;
    let stats = cache.stats()?;

    let location = match path {
        Some(path) => path.to_path_buf(),
        None => SqliteCache::default_path()?,
    };

    println!("{}", style("Manifest cache").bold());
    println!("  Path:      {}", location.display());
    println!("  Sources:   {}", stats.entry_count);
    println!("  Resources: {}", stats.resource_count);
    if let Some(oldest) = stats.oldest_entry {
        println!("  Oldest:    {}", oldest.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(newest) = stats.newest_entry {
        println!("  Newest:    {}", newest.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    Ok(())
}

pub fn clear(path: Option<&Path>) -> Result<()> {
    let removed = open(path)?.clear()?;
    println!(
        "{} Removed {} cached render(s)",
        style("✓").green().bold(),
        removed
    );
    Ok(())
}
