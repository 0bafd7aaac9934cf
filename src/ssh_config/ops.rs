//! Read-modify-write operations on a config file.
//!
//! Each call parses the file fresh, applies one change and writes the whole file back.
//! Nothing is cached between calls; two processes editing the same file race and the
//! last write wins.

use std::path::Path;

use tracing::{debug, info, warn};

use super::entry::HostEntry;
use super::parser::{parse_file, ParsedConfig};
use super::writer::write_file;
use crate::error::Result;

/// Appends `entry` after the existing blocks.
pub fn add_entry(path: &Path, entry: HostEntry) -> Result<()> {
    let mut config = load(path)?;
    info!(alias = %entry.alias, path = %path.display(), "adding host");
    config.entries.push(entry);
    save(path, &config)
}

/// Replaces the first block named `alias` with `entry`, keeping its position.
///
/// When `entry` carries no raw lines it inherits the replaced block's, so only the
/// values that actually changed are rewritten. Returns `false` (and still rewrites the
/// file unchanged) when no block matches.
pub fn update_entry(path: &Path, alias: &str, mut entry: HostEntry) -> Result<bool> {
    let mut config = load(path)?;

    let Some(slot) = config.entries.iter_mut().find(|e| e.alias == alias) else {
        debug!(alias, path = %path.display(), "no host to update");
        save(path, &config)?;
        return Ok(false);
    };

    if entry.raw_lines.is_empty() {
        entry.raw_lines = std::mem::take(&mut slot.raw_lines);
        entry.start_line = slot.start_line;
        entry.end_line = slot.end_line;
        entry.comment = std::mem::take(&mut slot.comment);
    }
    info!(alias, new_alias = %entry.alias, path = %path.display(), "updating host");
    *slot = entry;

    save(path, &config)?;
    Ok(true)
}

/// Removes every block named `alias`. Returns how many were removed.
pub fn delete_entry(path: &Path, alias: &str) -> Result<usize> {
    let mut config = load(path)?;
    let before = config.entries.len();
    config.entries.retain(|e| e.alias != alias);
    let removed = before - config.entries.len();

    info!(alias, removed, path = %path.display(), "deleting host");
    save(path, &config)?;
    Ok(removed)
}

fn load(path: &Path) -> Result<ParsedConfig> {
    let config = parse_file(path)?;
    for block in &config.dropped {
        warn!(
            alias = %block.alias,
            start_line = block.start_line,
            end_line = block.end_line,
            "host block without HostName will not be written back"
        );
    }
    Ok(config)
}

fn save(path: &Path, config: &ParsedConfig) -> Result<()> {
    write_file(path, &config.entries, &config.standalone)
}
