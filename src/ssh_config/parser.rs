use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use super::entry::{HostEntry, Keyword};
use super::line::{classify, BlockMeta, LineKind};
use crate::error::{Error, Result};

/// Everything read from one config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedConfig {
    /// Valid blocks in file order.
    pub entries: Vec<HostEntry>,
    /// Lines outside any block: file header, blank separators, unscoped directives.
    pub standalone: Vec<String>,
    /// Blocks that failed validation. They are not written back.
    pub dropped: Vec<DroppedBlock>,
}

impl ParsedConfig {
    pub fn find(&self, alias: &str) -> Option<&HostEntry> {
        self.entries.iter().find(|entry| entry.alias == alias)
    }
}

/// A block removed because it has no address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedBlock {
    pub alias: String,
    pub start_line: usize,
    pub end_line: usize,
    pub raw_lines: Vec<String>,
}

/// Reads and parses a config file. A missing file is an empty config.
pub fn parse_file(path: &Path) -> Result<ParsedConfig> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, starting empty");
            return Ok(ParsedConfig::default());
        }
        Err(e) => return Err(Error::io(path, e)),
    };

    let parsed = parse_str(&content);
    debug!(
        path = %path.display(),
        entries = parsed.entries.len(),
        standalone = parsed.standalone.len(),
        dropped = parsed.dropped.len(),
        "parsed ssh config"
    );
    Ok(parsed)
}

pub fn parse_str(content: &str) -> ParsedConfig {
    let mut parser = Parser::default();
    let mut line_count = 0;
    for (idx, line) in content.lines().enumerate() {
        line_count = idx + 1;
        parser.feed(line_count, line);
    }
    parser.finish(line_count)
}

struct OpenBlock {
    entry: HostEntry,
    /// Directives already assigned; later repeats are passthrough only.
    seen: Vec<Keyword>,
}

impl OpenBlock {
    fn assign(&mut self, keyword: Keyword, value: String) {
        if !self.seen.contains(&keyword) {
            self.seen.push(keyword);
            self.entry.set_field(keyword, value);
        }
    }

    /// Splits off the comment lines sitting directly above the next `Host` line.
    fn take_trailing_comments(&mut self) -> Vec<String> {
        let raw = &mut self.entry.raw_lines;
        let keep = raw
            .iter()
            .rposition(|line| !matches!(classify(line), LineKind::Comment(_)))
            .map_or(0, |idx| idx + 1);
        raw.split_off(keep)
    }
}

#[derive(Default)]
enum State {
    #[default]
    OutsideBlock,
    InsideBlock(OpenBlock),
}

#[derive(Default)]
struct Parser {
    state: State,
    /// Comments seen outside a block, waiting for a `Host` line to claim them.
    pending: Vec<String>,
    output: ParsedConfig,
}

impl Parser {
    fn feed(&mut self, line_no: usize, line: &str) {
        match classify(line) {
            LineKind::Directive {
                keyword: Some(Keyword::Host),
                value,
                ..
            } => self.open_block(line_no, line, value),
            kind => self.push_line(line, kind),
        }
    }

    fn push_line(&mut self, line: &str, kind: LineKind<'_>) {
        match &mut self.state {
            State::InsideBlock(block) => {
                block.entry.raw_lines.push(line.to_string());
                if let LineKind::Directive {
                    keyword: Some(keyword),
                    value,
                    ..
                } = kind
                {
                    block.assign(keyword, value);
                }
            }
            State::OutsideBlock => {
                if matches!(kind, LineKind::Comment(_)) {
                    self.pending.push(line.to_string());
                } else {
                    // Blank lines and unscoped directives end the comment run and are kept as-is
                    self.output.standalone.append(&mut self.pending);
                    self.output.standalone.push(line.to_string());
                }
            }
        }
    }

    fn open_block(&mut self, line_no: usize, line: &str, alias: String) {
        if let State::InsideBlock(mut block) = std::mem::take(&mut self.state) {
            self.pending = block.take_trailing_comments();
            let end_line = line_no - 1 - self.pending.len();
            self.close_block(block, end_line);
        }

        let mut raw_lines = std::mem::take(&mut self.pending);
        let start_line = line_no - raw_lines.len();
        raw_lines.push(line.to_string());

        self.state = State::InsideBlock(OpenBlock {
            entry: HostEntry {
                alias,
                raw_lines,
                start_line,
                ..Default::default()
            },
            seen: Vec::new(),
        });
    }

    fn close_block(&mut self, block: OpenBlock, end_line: usize) {
        let mut entry = block.entry;
        entry.end_line = end_line;

        let meta = BlockMeta::from_block(&entry.raw_lines);
        entry.description = meta.description;
        entry.tags = meta.tags;
        entry.comment = entry
            .raw_lines
            .iter()
            .filter(|line| matches!(classify(line), LineKind::Blank | LineKind::Comment(_)))
            .map(|line| format!("{line}\n"))
            .collect();

        if entry.is_valid() {
            self.output.entries.push(entry);
        } else {
            debug!(
                alias = %entry.alias,
                start_line = entry.start_line,
                end_line = entry.end_line,
                lines = entry.raw_lines.len(),
                "dropping host block without HostName"
            );
            self.output.dropped.push(DroppedBlock {
                alias: entry.alias,
                start_line: entry.start_line,
                end_line: entry.end_line,
                raw_lines: entry.raw_lines,
            });
        }
    }

    fn flush_pending(&mut self) {
        self.output.standalone.append(&mut self.pending);
    }

    fn finish(mut self, line_count: usize) -> ParsedConfig {
        if let State::InsideBlock(block) = std::mem::take(&mut self.state) {
            self.close_block(block, line_count);
        }
        self.flush_pending();
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_config() {
        let parsed = parse_str(
            "Host example\n    HostName example.com\n    User root\n    Port 22\n\nHost test\n    HostName test.com\n    User admin\n",
        );
        let aliases: Vec<_> = parsed.entries.iter().map(|e| e.alias.as_str()).collect();
        assert_eq!(aliases, vec!["example", "test"]);
        assert_eq!(parsed.entries[0].address, "example.com");
        assert_eq!(parsed.entries[0].user, "root");
        assert_eq!(parsed.entries[0].port, "22");
        assert_eq!(parsed.entries[1].address, "test.com");
        assert!(parsed.standalone.is_empty());
    }

    #[test]
    fn test_global_block_is_kept_without_hostname() {
        let parsed = parse_str("Host *\n    UseKeychain yes\n\nHost foo\n    User bob\n");
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].alias, "*");
        assert_eq!(parsed.dropped.len(), 1);
        assert_eq!(parsed.dropped[0].alias, "foo");
        assert_eq!(parsed.dropped[0].start_line, 4);
        assert_eq!(parsed.dropped[0].end_line, 5);
    }

    #[test]
    fn test_raw_lines_and_line_numbers() {
        let content = "# header\n\n# Description: Web\nHost web\n\tHostName web.local\n\n";
        let parsed = parse_str(content);
        let entry = &parsed.entries[0];

        assert_eq!(parsed.standalone, vec!["# header".to_string(), String::new()]);
        assert_eq!(entry.start_line, 3);
        assert_eq!(entry.end_line, 6);
        assert_eq!(
            entry.raw_lines,
            vec!["# Description: Web", "Host web", "\tHostName web.local", ""]
        );
        assert_eq!(entry.comment, "# Description: Web\n\n");
    }

    #[test]
    fn test_description_precedence() {
        let parsed = parse_str("# random note\n# Description: Prod box\nHost prod\n    HostName p\n");
        assert_eq!(parsed.entries[0].description, "Prod box");
    }

    #[test]
    fn test_description_inside_block() {
        let parsed = parse_str("Host a\n    # Description: Inner\n    HostName a\n");
        assert_eq!(parsed.entries[0].description, "Inner");
    }

    #[test]
    fn test_description_fallback_to_plain_comment() {
        let parsed = parse_str("## Section\n# the build box\nHost ci\n    HostName ci.local\n");
        assert_eq!(parsed.entries[0].description, "the build box");
    }

    #[test]
    fn test_comments_above_next_host_belong_to_it() {
        let parsed = parse_str(
            "Host a\n    HostName a.local\n\n# Description: Second\n# Tags: prod, db\nHost b\n    HostName b.local\n",
        );
        let (a, b) = (&parsed.entries[0], &parsed.entries[1]);

        assert_eq!(a.raw_lines, vec!["Host a", "    HostName a.local", ""]);
        assert_eq!(a.end_line, 3);
        assert_eq!(a.description, "");
        assert_eq!(b.start_line, 4);
        assert_eq!(b.description, "Second");
        assert_eq!(b.tags, vec!["prod".to_string(), "db".to_string()]);
    }

    #[test]
    fn test_first_directive_wins_and_identity_file() {
        let parsed = parse_str(
            "Host gh\n    HostName github.com\n    IdentityFile ~/.ssh/id_a\n    IdentityFile ~/.ssh/id_b\n    ProxyJump bastion\n",
        );
        let entry = &parsed.entries[0];
        assert_eq!(entry.identity_file, "~/.ssh/id_a");
        assert_eq!(entry.raw_lines.len(), 5);
    }

    #[test]
    fn test_unscoped_directives_stay_standalone() {
        let parsed = parse_str("# defaults\nServerAliveInterval 60\nHost a\n  HostName a\n");
        assert_eq!(
            parsed.standalone,
            vec!["# defaults".to_string(), "ServerAliveInterval 60".to_string()]
        );
        assert_eq!(parsed.entries[0].raw_lines, vec!["Host a", "  HostName a"]);
    }

    #[test]
    fn test_directive_names_are_case_insensitive() {
        let parsed = parse_str("HOST box\n  hostname box.local\n  USER me\n  pOrT 2200\n");
        let entry = &parsed.entries[0];
        assert_eq!(entry.alias, "box");
        assert_eq!(entry.address, "box.local");
        assert_eq!(entry.user, "me");
        assert_eq!(entry.port, "2200");
    }

    #[test]
    fn test_trailing_comments_at_eof_stay_in_block() {
        let parsed = parse_str("Host a\n  HostName a\n# end of file\n");
        assert_eq!(parsed.entries[0].raw_lines.last().map(String::as_str), Some("# end of file"));
        assert!(parsed.standalone.is_empty());
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(parse_str(""), ParsedConfig::default());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let parsed = parse_file(&dir.path().join("nope")).unwrap();
        assert!(parsed.entries.is_empty());
        assert!(parsed.standalone.is_empty());
    }
}
