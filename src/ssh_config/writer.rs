use std::path::Path;

use tracing::debug;

use super::entry::{HostEntry, Keyword};
use super::line::{BlockMeta, LineKind, classify, indentation, is_host_line, tags_text};
use crate::error::Result;
use crate::io;

const DEFAULT_INDENT: &str = "    ";

/// Writes the whole config file, replacing it atomically.
pub fn write_file(path: &Path, entries: &[HostEntry], standalone: &[String]) -> Result<()> {
    let content = render(entries, standalone);
    io::write_atomic(path, content.as_bytes())?;

    debug!(
        path = %path.display(),
        entries = entries.len(),
        bytes = content.len(),
        "wrote ssh config"
    );
    Ok(())
}

/// Renders standalone lines followed by every entry.
///
/// Entries read from a file bring their own separating blank lines; a blank line is only
/// inserted next to entries that were built in code.
pub fn render(entries: &[HostEntry], standalone: &[String]) -> String {
    let mut lines: Vec<String> = standalone.to_vec();
    let mut previous_fresh = false;

    for entry in entries {
        let fresh = entry.raw_lines.is_empty();
        let ends_blank = lines.last().is_none_or(|line| line.trim().is_empty());
        if !ends_blank && (fresh || previous_fresh) {
            lines.push(String::new());
        }
        lines.extend(render_entry(entry));
        previous_fresh = fresh;
    }

    let mut out = String::new();
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

pub fn render_entry(entry: &HostEntry) -> Vec<String> {
    if entry.raw_lines.is_empty() {
        fresh_block(entry)
    } else {
        rewrite_block(&entry.raw_lines, entry)
    }
}

fn fresh_block(entry: &HostEntry) -> Vec<String> {
    let mut lines = Vec::new();
    if !entry.description.is_empty() {
        lines.push(description_line("", &entry.description));
    }
    if !entry.tags.is_empty() {
        lines.push(tags_line("", &entry.tags));
    }
    lines.push(format!("{} {}", Keyword::Host, entry.alias));
    for keyword in Keyword::FIELDS {
        let value = entry.field(keyword);
        if !value.is_empty() {
            lines.push(format!("{DEFAULT_INDENT}{keyword} {value}"));
        }
    }
    lines
}

/// Replays the original lines of a block against the entry's current values.
///
/// Untouched lines come back byte-for-byte. A changed directive keeps its indentation and
/// spelling and only swaps the value; an emptied one is dropped. Directives set on the
/// entry but absent from the block are appended at the block's indentation.
///
/// The block's `# Description:` line is rewritten where it stands, above or below `Host`.
/// Without one, a new description goes directly above `Host`. Clearing a description
/// that a plain comment would otherwise supply leaves an empty `# Description:` line.
pub fn rewrite_block<S: AsRef<str>>(raw_lines: &[S], entry: &HostEntry) -> Vec<String> {
    let host_idx = raw_lines
        .iter()
        .position(|line| is_host_line(line.as_ref()))
        .unwrap_or(raw_lines.len());
    let original = BlockMeta::from_block(raw_lines);
    let description_changed = entry.description != original.description;
    let tags_changed = entry.tags != original.tags;

    let mut out = Vec::with_capacity(raw_lines.len() + 2);
    let mut tags_seen = false;
    let mut seen: Vec<Keyword> = Vec::new();

    for (idx, raw) in raw_lines.iter().enumerate() {
        let line = raw.as_ref();

        if original.description_line == Some(idx) {
            if !description_changed {
                out.push(line.to_string());
            } else if !entry.description.is_empty() || original.has_fallback {
                out.push(description_line(indentation(line), &entry.description));
            }
            continue;
        }

        match classify(line) {
            LineKind::Comment(comment) if idx < host_idx => {
                if !tags_seen && tags_text(comment).is_some() {
                    tags_seen = true;
                    if !tags_changed {
                        out.push(line.to_string());
                    } else if !entry.tags.is_empty() {
                        out.push(tags_line(indentation(line), &entry.tags));
                    }
                } else {
                    out.push(line.to_string());
                }
            }
            LineKind::Directive {
                name,
                keyword: Some(Keyword::Host),
                value,
            } if idx == host_idx => {
                let needs_description = description_changed
                    && original.description_line.is_none()
                    && (!entry.description.is_empty() || original.has_fallback);
                if needs_description {
                    out.push(description_line("", &entry.description));
                }
                if tags_changed && !tags_seen && !entry.tags.is_empty() {
                    out.push(tags_line("", &entry.tags));
                }
                out.push(replace_value(line, name, &value, &entry.alias));
            }
            LineKind::Directive {
                name,
                keyword: Some(keyword),
                value,
            } if keyword != Keyword::Host && !seen.contains(&keyword) => {
                seen.push(keyword);
                let current = entry.field(keyword);
                if !current.is_empty() {
                    out.push(replace_value(line, name, &value, current));
                }
            }
            _ => out.push(line.to_string()),
        }
    }

    let indent = detect_indent(raw_lines);
    let missing: Vec<String> = Keyword::FIELDS
        .into_iter()
        .filter(|keyword| !seen.contains(keyword))
        .filter_map(|keyword| {
            let value = entry.field(keyword);
            (!value.is_empty()).then(|| format!("{indent}{keyword} {value}"))
        })
        .collect();

    // After the last directive, so trailing blanks and comments stay at the end
    let insert_at = out
        .iter()
        .rposition(|line| matches!(classify(line), LineKind::Directive { .. }))
        .map_or(out.len(), |idx| idx + 1);
    let tail = out.split_off(insert_at);
    out.extend(missing);
    out.extend(tail);

    out
}

fn replace_value(line: &str, name: &str, old: &str, new: &str) -> String {
    if old == new {
        line.to_string()
    } else {
        format!("{}{name} {new}", indentation(line))
    }
}

/// Indentation of the first indented directive after `Host`, or four spaces.
fn detect_indent<S: AsRef<str>>(raw_lines: &[S]) -> String {
    for raw in raw_lines {
        let line = raw.as_ref();
        if is_host_line(line) || !matches!(classify(line), LineKind::Directive { .. }) {
            continue;
        }
        let indent = indentation(line);
        if !indent.is_empty() {
            return indent.to_string();
        }
    }
    DEFAULT_INDENT.to_string()
}

fn description_line(indent: &str, description: &str) -> String {
    if description.is_empty() {
        format!("{indent}# Description:")
    } else {
        format!("{indent}# Description: {description}")
    }
}

fn tags_line(indent: &str, tags: &[String]) -> String {
    format!("{indent}# Tags: {}", tags.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssh_config::parser::parse_str;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn round_trip(content: &str) -> String {
        let parsed = parse_str(content);
        render(&parsed.entries, &parsed.standalone)
    }

    #[rstest]
    #[case("Host example\n    HostName example.com\n    User root\n    Port 22\n")]
    #[case("Host example\n\tHostName example.com\n\tUser root\n\tPort 22\n")]
    #[case("# My hosts\n\n# Description: Prod\nHost prod\n  hostname prod.example.com\n  USER deploy\n\n# staging box\nHost staging\n    HostName staging.example.com\n")]
    #[case("Compression yes\nHost *\n    AddKeysToAgent yes\n\nHost a\n    HostName a\n    # inner note\n\n    ProxyJump b\n\n\n")]
    #[case("## Work\n# Tags: work, eu\nHost w1\n    HostName w1.corp\nHost w2\n    HostName w2.corp\n")]
    fn test_round_trip_identity(#[case] content: &str) {
        assert_eq!(round_trip(content), content);
    }

    #[test]
    fn test_value_change_keeps_shape() {
        let content = "Host example\n\tHostName example.com\n\tpOrT 22\n\tUser root\n";
        let mut parsed = parse_str(content);
        parsed.entries[0].port = "2222".to_string();

        let out = render(&parsed.entries, &parsed.standalone);
        assert_eq!(out, "Host example\n\tHostName example.com\n\tpOrT 2222\n\tUser root\n");
    }

    #[test]
    fn test_emptied_optional_directives_are_removed() {
        let raw = ["Host a", "  HostName a.local", "  User root", "  Port 22", "  IdentityFile ~/.ssh/id_a"];
        let entry = HostEntry::new("a", "a.local");
        assert_eq!(rewrite_block(&raw, &entry), vec!["Host a", "  HostName a.local"]);
    }

    #[test]
    fn test_missing_directives_use_detected_indent() {
        let raw = ["Host a", "\tHostName a.local"];
        let entry = HostEntry::new("a", "a.local").with_user("bob").with_port("2200");
        assert_eq!(
            rewrite_block(&raw, &entry),
            vec!["Host a", "\tHostName a.local", "\tUser bob", "\tPort 2200"]
        );
    }

    #[test]
    fn test_missing_directives_go_before_trailing_blanks() {
        let raw = ["Host a", "    HostName a.local", "", "# next section", ""];
        let entry = HostEntry::new("a", "a.local").with_port("2200");
        assert_eq!(
            rewrite_block(&raw, &entry),
            vec!["Host a", "    HostName a.local", "    Port 2200", "", "# next section", ""]
        );
    }

    #[test]
    fn test_missing_directives_default_indent() {
        let raw = ["Host *", "ForwardAgent yes"];
        let entry = HostEntry::new("*", "").with_user("me");
        assert_eq!(rewrite_block(&raw, &entry), vec!["Host *", "ForwardAgent yes", "    User me"]);
    }

    #[test]
    fn test_alias_rename_keeps_keyword_spelling() {
        let raw = ["host old", "  HostName x"];
        let entry = HostEntry::new("new", "x");
        assert_eq!(rewrite_block(&raw, &entry), vec!["host new", "  HostName x"]);
    }

    #[test]
    fn test_description_is_replaced_not_duplicated() {
        let raw = ["# Description: Original", "Host a", "    HostName a"];
        let entry = HostEntry::new("a", "a").with_description("Updated");
        let out = rewrite_block(&raw, &entry);

        assert_eq!(out, vec!["# Description: Updated", "Host a", "    HostName a"]);
    }

    #[test]
    fn test_description_inserted_before_host() {
        let raw = ["# just a note", "Host a", "    HostName a"];
        let entry = HostEntry::new("a", "a").with_description("Fresh");
        let out = rewrite_block(&raw, &entry);

        assert_eq!(out, vec!["# just a note", "# Description: Fresh", "Host a", "    HostName a"]);
    }

    #[test]
    fn test_fallback_description_is_not_rewritten() {
        let raw = ["# just a note", "Host a", "    HostName a"];
        let entry = HostEntry::new("a", "a").with_description("just a note");
        assert_eq!(rewrite_block(&raw, &entry), raw.to_vec());
    }

    #[test]
    fn test_description_inside_block_replaced_in_place() {
        let raw = ["Host a", "    # Description: Old", "    HostName a"];
        let entry = HostEntry::new("a", "a").with_description("New");
        assert_eq!(
            rewrite_block(&raw, &entry),
            vec!["Host a", "    # Description: New", "    HostName a"]
        );
    }

    #[test]
    fn test_description_inside_block_removed() {
        let raw = ["Host a", "    # Description: Old", "    HostName a"];
        let entry = HostEntry::new("a", "a");
        assert_eq!(rewrite_block(&raw, &entry), vec!["Host a", "    HostName a"]);
    }

    #[test]
    fn test_clearing_fallback_description_writes_empty_label() {
        let raw = ["# just a note", "Host a", "    HostName a"];
        let entry = HostEntry::new("a", "a");
        let out = rewrite_block(&raw, &entry);

        assert_eq!(out, vec!["# just a note", "# Description:", "Host a", "    HostName a"]);
        assert_eq!(parse_str(&(out.join("\n") + "\n")).entries[0].description, "");
    }

    #[test]
    fn test_clearing_explicit_description_keeps_label_over_plain_comment() {
        let raw = ["# just a note", "# Description: Prod", "Host a", "    HostName a"];
        let entry = HostEntry::new("a", "a");
        assert_eq!(
            rewrite_block(&raw, &entry),
            vec!["# just a note", "# Description:", "Host a", "    HostName a"]
        );
    }

    #[test]
    fn test_tags_line_updated_and_removed() {
        let raw = ["# Tags: a, b", "Host a", "    HostName a"];
        let retagged = HostEntry::new("a", "a").with_tags(["c"]);
        assert_eq!(rewrite_block(&raw, &retagged)[0], "# Tags: c");

        let untagged = HostEntry::new("a", "a");
        assert_eq!(rewrite_block(&raw, &untagged), vec!["Host a", "    HostName a"]);
    }

    #[test]
    fn test_duplicate_directive_only_first_is_rewritten() {
        let raw = ["Host gh", "  HostName github.com", "  IdentityFile one", "  IdentityFile two"];
        let entry = HostEntry::new("gh", "github.com").with_identity_file("three");
        assert_eq!(
            rewrite_block(&raw, &entry),
            vec!["Host gh", "  HostName github.com", "  IdentityFile three", "  IdentityFile two"]
        );
    }

    #[test]
    fn test_fresh_entry_layout() {
        let entry = HostEntry::new("db", "10.0.0.5")
            .with_user("admin")
            .with_port("5432")
            .with_identity_file("~/.ssh/id_db")
            .with_description("Database")
            .with_tags(["prod"]);
        assert_eq!(
            render(&[entry], &[]),
            "# Description: Database\n# Tags: prod\nHost db\n    HostName 10.0.0.5\n    User admin\n    Port 5432\n    IdentityFile ~/.ssh/id_db\n"
        );
    }

    #[test]
    fn test_fresh_entries_are_separated() {
        let entries = [HostEntry::new("a", "a"), HostEntry::new("b", "b")];
        let standalone = ["# header".to_string()];
        assert_eq!(
            render(&entries, &standalone),
            "# header\n\nHost a\n    HostName a\n\nHost b\n    HostName b\n"
        );
    }

    #[test]
    fn test_appended_entry_after_parsed_block() {
        let mut parsed = parse_str("Host a\n    HostName a\n");
        parsed.entries.push(HostEntry::new("b", "b"));
        assert_eq!(
            render(&parsed.entries, &parsed.standalone),
            "Host a\n    HostName a\n\nHost b\n    HostName b\n"
        );
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(render(&[], &[]), "");
    }

    #[test]
    fn test_write_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".ssh").join("config");

        write_file(&path, &[HostEntry::new("a", "a")], &[]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Host a\n    HostName a\n");
    }
}
