//! Classification of single config lines, shared by the parser and the writer.

use super::entry::Keyword;

/// What a single line of the config file is, as far as this crate cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineKind<'a> {
    Blank,
    /// A comment; holds the line with leading whitespace removed (starts with `#`).
    Comment(&'a str),
    /// `<name> <value...>`. `keyword` is `None` for directives this crate does not model
    /// and for recognized directives that carry no value.
    Directive {
        name: &'a str,
        keyword: Option<Keyword>,
        value: String,
    },
}

pub(crate) fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed.starts_with('#') {
        return LineKind::Comment(trimmed);
    }

    let mut parts = trimmed.split_whitespace();
    let name = parts.next().unwrap_or_default();
    // Values are rejoined with single spaces
    let value = parts.collect::<Vec<_>>().join(" ");
    let keyword = if value.is_empty() {
        None
    } else {
        Keyword::from_name(name)
    };

    LineKind::Directive {
        name,
        keyword,
        value,
    }
}

/// Leading whitespace of a raw line, tabs and spaces preserved.
pub(crate) fn indentation(line: &str) -> &str {
    &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
}

/// Text of a `# Description: X` comment.
pub(crate) fn description_text(comment: &str) -> Option<&str> {
    labelled(comment, "Description:")
}

/// Labels of a `# Tags: a, b` comment.
pub(crate) fn tags_text(comment: &str) -> Option<Vec<String>> {
    labelled(comment, "Tags:").map(split_tags)
}

pub(crate) fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn labelled<'a>(comment: &'a str, label: &str) -> Option<&'a str> {
    comment
        .strip_prefix('#')?
        .trim_start()
        .strip_prefix(label)
        .map(str::trim)
}

/// True for a `Host <alias>` line.
pub(crate) fn is_host_line(line: &str) -> bool {
    matches!(
        classify(line),
        LineKind::Directive {
            keyword: Some(Keyword::Host),
            ..
        }
    )
}

/// Description and tags carried by the comments of one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct BlockMeta {
    pub description: String,
    pub tags: Vec<String>,
    /// Index of the `# Description:` line that supplied `description`.
    pub description_line: Option<usize>,
    /// Whether a plain comment above `Host` would be read as the description if no
    /// `# Description:` line existed.
    pub has_fallback: bool,
}

impl BlockMeta {
    /// Reads the raw lines of a block; lines before its `Host` line are the leading comments.
    ///
    /// Precedence: a `# Description:` above `Host`, then one inside the block, then the
    /// first plain comment above `Host`. `##` headings and `# Tags:` lines never become a
    /// description. Tags only come from above `Host`. Without a `Host` line every line
    /// counts as leading.
    pub fn from_block<S: AsRef<str>>(raw_lines: &[S]) -> Self {
        let host_idx = raw_lines
            .iter()
            .position(|line| is_host_line(line.as_ref()))
            .unwrap_or(raw_lines.len());

        let mut explicit = None;
        let mut inner = None;
        let mut fallback = None;
        let mut tags = None;

        for (idx, raw) in raw_lines.iter().enumerate() {
            let LineKind::Comment(comment) = classify(raw.as_ref()) else {
                continue;
            };
            if idx > host_idx {
                if inner.is_none() {
                    inner = description_text(comment).map(|text| (idx, text));
                }
                continue;
            }

            if let Some(text) = description_text(comment) {
                explicit.get_or_insert((idx, text));
            } else if let Some(found) = tags_text(comment) {
                tags.get_or_insert(found);
            } else if !comment.starts_with("##") {
                let text = comment.trim_start_matches('#').trim();
                if !text.is_empty() {
                    fallback.get_or_insert(text);
                }
            }
        }

        let chosen = explicit.or(inner);
        Self {
            description: chosen
                .map(|(_, text)| text)
                .or(fallback)
                .unwrap_or_default()
                .to_string(),
            tags: tags.unwrap_or_default(),
            description_line: chosen.map(|(idx, _)| idx),
            has_fallback: fallback.is_some(),
        }
    }
}
