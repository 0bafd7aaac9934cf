//! Discovery of private key files for the identity-file picker.

use std::path::{Path, PathBuf};

use tracing::debug;

const KEY_PREFIXES: [&str; 2] = ["id_", "key_"];
const NOT_KEYS: [&str; 3] = ["known_hosts", "config", "authorized_keys"];

/// Private keys in `dir` named `id_*` or `key_*`, sorted by name.
///
/// Public halves and the usual non-key files are skipped. Keys inside the user's own
/// `~/.ssh` are reported as `~/.ssh/<name>`, the form people write in their config.
pub fn discover_keys(dir: &Path) -> Vec<String> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let mut found: Vec<PathBuf> = Vec::new();

    for prefix in KEY_PREFIXES {
        let pattern = format!("{escaped}/{prefix}*");
        let paths = match glob::glob(&pattern) {
            Ok(paths) => paths,
            Err(e) => {
                debug!(pattern = %pattern, error = %e, "invalid key pattern");
                continue;
            }
        };
        found.extend(paths.flatten().filter(|path| is_private_key(path)));
    }

    found.sort();
    found.dedup();

    let home_ssh = dirs::home_dir().map(|home| home.join(".ssh"));
    let keys: Vec<String> = found
        .iter()
        .map(|path| display_path(path, home_ssh.as_deref()))
        .collect();
    debug!(dir = %dir.display(), keys = keys.len(), "discovered key files");
    keys
}

fn is_private_key(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    !name.ends_with(".pub") && !NOT_KEYS.contains(&name)
}

fn display_path(path: &Path, home_ssh: Option<&Path>) -> String {
    match (home_ssh, path.file_name()) {
        (Some(home_ssh), Some(name)) if path.parent() == Some(home_ssh) => {
            format!("~/.ssh/{}", name.to_string_lossy())
        }
        _ => path.display().to_string(),
    }
}
