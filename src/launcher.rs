//! Hands the terminal over to the system `ssh` client.

use std::process::{Command, ExitStatus};

use tracing::info;

use crate::error::{Error, Result};

const SSH_PROGRAM: &str = "ssh";

/// `ssh <alias>`; the alias is resolved by ssh itself through the config file.
pub fn ssh_command(alias: &str) -> Command {
    let mut cmd = Command::new(SSH_PROGRAM);
    cmd.arg(alias);
    cmd
}

/// Runs ssh with inherited stdio and waits for the session to end.
pub fn connect(alias: &str) -> Result<ExitStatus> {
    info!(alias, "connecting");
    ssh_command(alias)
        .status()
        .map_err(|e| Error::io(SSH_PROGRAM, e))
}
