use crate::error::{Error, Result};
use crate::ssh_config::{GLOBAL_ALIAS, HostEntry, split_tags};

/// Text fields of the add/edit dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostForm {
    pub alias: String,
    pub address: String,
    pub user: String,
    pub port: String,
    pub identity_file: String,
    pub description: String,
    /// Comma separated
    pub tags: String,
}

impl HostForm {
    pub fn for_new_host() -> Self {
        Self {
            user: "root".to_string(),
            port: "22".to_string(),
            ..Default::default()
        }
    }

    pub fn from_entry(entry: &HostEntry) -> Self {
        Self {
            alias: entry.alias.clone(),
            address: entry.address.clone(),
            user: entry.user.clone(),
            port: entry.port.clone(),
            identity_file: entry.identity_file.clone(),
            description: entry.description.clone(),
            tags: entry.tags.join(", "),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let alias = self.alias.trim();
        if alias.is_empty() {
            return Err(Error::InvalidEntry("Host alias is required".to_string()));
        }
        if alias.contains(char::is_whitespace) && alias != GLOBAL_ALIAS {
            return Err(Error::InvalidEntry(
                "Host alias cannot contain spaces".to_string(),
            ));
        }
        if alias != GLOBAL_ALIAS && self.address.trim().is_empty() {
            return Err(Error::InvalidEntry("HostName is required".to_string()));
        }
        let port = self.port.trim();
        if !port.is_empty() && port.parse::<u16>().is_err() {
            return Err(Error::InvalidEntry(format!("Port must be a number, got '{port}'")));
        }
        Ok(())
    }

    /// A new entry without raw lines; updating a host carries the old lines over.
    pub fn to_entry(&self) -> HostEntry {
        HostEntry::new(self.alias.trim(), self.address.trim())
            .with_user(self.user.trim())
            .with_port(self.port.trim())
            .with_identity_file(self.identity_file.trim())
            .with_description(self.description.trim())
            .with_tags(split_tags(&self.tags))
    }
}
