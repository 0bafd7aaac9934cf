//! Round-trip model of an OpenSSH client config file.
//!
//! [`parse_file`] turns the file into [`HostEntry`] blocks plus the lines that belong to
//! no block; [`write_file`] turns them back into text, reproducing every line whose value
//! did not change.

mod entry;
mod line;
mod ops;
mod parser;
mod writer;

use std::path::PathBuf;

pub use entry::{GLOBAL_ALIAS, HostEntry, Keyword};
pub(crate) use line::split_tags;
pub use ops::{add_entry, delete_entry, update_entry};
pub use parser::{DroppedBlock, ParsedConfig, parse_file, parse_str};
pub use writer::{render, render_entry, rewrite_block, write_file};

use crate::error::{Error, Result};

/// `~/.ssh/config`
pub fn default_config_path() -> Result<PathBuf> {
    Ok(ssh_dir()?.join("config"))
}

/// `~/.ssh`
pub fn ssh_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".ssh"))
        .ok_or(Error::HomeDirUnavailable)
}

/// Expands a leading `~` or `~/` against the home directory.
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    if path == "~" {
        return dirs::home_dir().ok_or(Error::HomeDirUnavailable);
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .ok_or(Error::HomeDirUnavailable),
        None => Ok(PathBuf::from(path)),
    }
}
