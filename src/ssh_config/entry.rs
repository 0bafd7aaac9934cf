use std::fmt;

/// Alias of the global-options block.
pub const GLOBAL_ALIAS: &str = "*";

/// Directives this crate understands. Everything else is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Host,
    HostName,
    User,
    Port,
    IdentityFile,
}

impl Keyword {
    /// Directives that live inside a block, in the order they are written for new entries.
    pub const FIELDS: [Keyword; 4] = [
        Keyword::HostName,
        Keyword::User,
        Keyword::Port,
        Keyword::IdentityFile,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "host" => Some(Self::Host),
            "hostname" => Some(Self::HostName),
            "user" => Some(Self::User),
            "port" => Some(Self::Port),
            "identityfile" => Some(Self::IdentityFile),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Host => "Host",
            Self::HostName => "HostName",
            Self::User => "User",
            Self::Port => "Port",
            Self::IdentityFile => "IdentityFile",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `Host` block of the config file.
///
/// Empty strings mean "not set". `raw_lines` holds the block exactly as it was read,
/// leading comments included, so the writer can reproduce whatever was not edited.
/// Entries built in code leave `raw_lines` empty and are written from scratch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEntry {
    pub alias: String,
    pub address: String,
    pub user: String,
    pub port: String,
    pub identity_file: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Comment and blank lines of the block as written, each terminated by `\n`.
    pub comment: String,
    pub raw_lines: Vec<String>,
    /// 1-based, inclusive. Zero for entries that were never read from a file.
    pub start_line: usize,
    pub end_line: usize,
}

impl HostEntry {
    pub fn new(alias: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    pub fn with_identity_file(mut self, identity_file: impl Into<String>) -> Self {
        self.identity_file = identity_file.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_global(&self) -> bool {
        self.alias == GLOBAL_ALIAS
    }

    /// `Host *` needs nothing else; every other block needs an address.
    pub fn is_valid(&self) -> bool {
        if self.alias.is_empty() {
            return false;
        }
        self.is_global() || !self.address.is_empty()
    }

    /// Current value of a typed directive.
    pub fn field(&self, keyword: Keyword) -> &str {
        match keyword {
            Keyword::Host => &self.alias,
            Keyword::HostName => &self.address,
            Keyword::User => &self.user,
            Keyword::Port => &self.port,
            Keyword::IdentityFile => &self.identity_file,
        }
    }

    pub(crate) fn set_field(&mut self, keyword: Keyword, value: String) {
        match keyword {
            Keyword::Host => self.alias = value,
            Keyword::HostName => self.address = value,
            Keyword::User => self.user = value,
            Keyword::Port => self.port = value,
            Keyword::IdentityFile => self.identity_file = value,
        }
    }

    /// `user@address`, or just the address when no user is set.
    pub fn connection_string(&self) -> String {
        if self.user.is_empty() {
            self.address.clone()
        } else {
            format!("{}@{}", self.user, self.address)
        }
    }

    pub fn ssh_command(&self) -> String {
        let mut cmd = String::from("ssh");
        if !self.port.is_empty() {
            cmd.push_str(" -p ");
            cmd.push_str(&self.port);
        }
        cmd.push(' ');
        cmd.push_str(&self.connection_string());
        cmd
    }

    /// Case-insensitive match against alias, address, user, description and tags.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        if query.is_empty() {
            return true;
        }
        [&self.alias, &self.address, &self.user, &self.description]
            .into_iter()
            .chain(self.tags.iter())
            .any(|text| text.to_lowercase().contains(&query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(HostEntry::new("example", "example.com"), true)]
    #[case(HostEntry::new("*", ""), true)]
    #[case(HostEntry::new("", "example.com"), false)]
    #[case(HostEntry::new("example", ""), false)]
    #[case(
        HostEntry::new("example", "example.com")
            .with_user("root")
            .with_port("22")
            .with_identity_file("~/.ssh/id_rsa")
            .with_description("Test server"),
        true
    )]
    fn test_is_valid(#[case] entry: HostEntry, #[case] expected: bool) {
        assert_eq!(entry.is_valid(), expected);
    }

    #[rstest]
    #[case(HostEntry::new("a", "example.com").with_user("root"), "root@example.com")]
    #[case(HostEntry::new("a", "example.com"), "example.com")]
    #[case(HostEntry::new("a", "192.168.1.1").with_user("admin"), "admin@192.168.1.1")]
    fn test_connection_string(#[case] entry: HostEntry, #[case] expected: &str) {
        assert_eq!(entry.connection_string(), expected);
    }

    #[rstest]
    #[case(HostEntry::new("a", "example.com").with_user("root"), "ssh root@example.com")]
    #[case(
        HostEntry::new("a", "example.com").with_user("root").with_port("2222"),
        "ssh -p 2222 root@example.com"
    )]
    #[case(HostEntry::new("a", "example.com"), "ssh example.com")]
    fn test_ssh_command(#[case] entry: HostEntry, #[case] expected: &str) {
        assert_eq!(entry.ssh_command(), expected);
    }

    #[test]
    fn test_keyword_lookup_ignores_case() {
        assert_eq!(Keyword::from_name("HOSTNAME"), Some(Keyword::HostName));
        assert_eq!(Keyword::from_name("identityFile"), Some(Keyword::IdentityFile));
        assert_eq!(Keyword::from_name("ProxyJump"), None);
    }

    #[test]
    fn test_matches_searches_tags_and_description() {
        let entry = HostEntry::new("db", "10.0.0.5")
            .with_description("Primary Postgres")
            .with_tags(["prod", "eu-west"]);
        assert!(entry.matches("postgres"));
        assert!(entry.matches("EU"));
        assert!(entry.matches(""));
        assert!(!entry.matches("staging"));
    }
}
