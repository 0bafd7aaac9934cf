//! How often each host has been connected to, persisted as a small JSON map.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::io;

/// `<config dir>/ssh-host-manager/visits.json`
pub fn default_visits_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("ssh-host-manager").join("visits.json"))
        .ok_or(Error::HomeDirUnavailable)
}

#[derive(Debug, Clone, Default)]
pub struct VisitStore {
    counts: BTreeMap<String, u64>,
    path: PathBuf,
}

impl VisitStore {
    /// Loads counts from `path`; a missing file means no visits yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let counts = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| Error::VisitStore {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(Error::io(&path, e)),
        };
        debug!(path = %path.display(), hosts = counts.len(), "loaded visit counts");
        Ok(Self { counts, path })
    }

    /// No counts; [`save`](Self::save) will create `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            counts: BTreeMap::new(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_count(&self, alias: &str) -> u64 {
        self.counts.get(alias).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, alias: &str) {
        *self.counts.entry(alias.to_string()).or_default() += 1;
    }

    pub fn clear_all(&mut self) {
        self.counts.clear();
    }

    /// Most visited first; equal counts in alphabetical order.
    pub fn sort_by_frequency<S: AsRef<str>>(&self, aliases: &[S]) -> Vec<String> {
        let mut sorted: Vec<(u64, &str)> = aliases
            .iter()
            .map(|alias| (self.get_count(alias.as_ref()), alias.as_ref()))
            .collect();
        sorted.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        sorted.into_iter().map(|(_, alias)| alias.to_string()).collect()
    }

    pub fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.counts).map_err(|source| {
            Error::VisitStore {
                path: self.path.clone(),
                source,
            }
        })?;

        io::write_atomic(&self.path, content.as_bytes())?;

        debug!(path = %self.path.display(), hosts = self.counts.len(), "saved visit counts");
        Ok(())
    }
}
