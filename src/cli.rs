use std::path::PathBuf;

use clap::Parser;

use crate::error::Result;
use crate::ssh_config::{default_config_path, expand_tilde};
use crate::visits::default_visits_path;

#[derive(Debug, Parser)]
#[command(name = "ssh-host-manager", version, about = "Browse, edit and connect to the hosts in your SSH config")]
pub struct Cli {
    /// SSH client config to manage [default: ~/.ssh/config]
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Where visit counts are kept
    #[arg(long, value_name = "PATH")]
    pub visits: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Show credits and exit
    #[arg(long)]
    pub credits: bool,
}

/// Paths the application works on, after defaults and `~` expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub config_path: PathBuf,
    pub visits_path: PathBuf,
}

impl Cli {
    pub fn settings(&self) -> Result<Settings> {
        let config_path = match &self.config {
            Some(path) => expand_tilde(path)?,
            None => default_config_path()?,
        };
        let visits_path = match &self.visits {
            Some(path) => expand_tilde(path)?,
            None => default_visits_path()?,
        };
        Ok(Settings {
            config_path,
            visits_path,
        })
    }
}
