//! Markup scanner.
//!
//! A regex pass over open tags, matching element and attribute names
//! against the markup tables. No DOM is built; comments are excluded and
//! everything else is best-effort, which is all the pipeline needs to
//! place a feature at a line and column.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::mapping::MappingTables;
use crate::scanners::position::LineIndex;
use crate::types::{Occurrence, OccurrenceKind};

static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([a-zA-Z][a-zA-Z0-9-]*)((?:"[^"]*"|'[^']*'|[^>"'])*)>"#).expect("static pattern")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)([a-zA-Z][a-zA-Z0-9_:-]*)\s*(?:=\s*(?:"[^"]*"|'[^']*'|[^\s>]+))?"#)
        .expect("static pattern")
});

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static pattern"));

pub struct MarkupScanner;

impl MarkupScanner {
    pub fn new() -> Self {
        Self
    }

    /// Walk open tags and return occurrences in document order.
    /// Total: never fails on malformed markup.
    pub fn detect(&self, text: &str, path: &Path, tables: &MappingTables) -> Vec<Occurrence> {
        let file = path.display().to_string();
        let index = LineIndex::new(text);
        let comments: Vec<(usize, usize)> =
            COMMENT.find_iter(text).map(|m| (m.start(), m.end())).collect();

        let mut out = Vec::new();
        for tag in OPEN_TAG.captures_iter(text) {
            let whole = tag.get(0).expect("group 0 always present");
            if comments.iter().any(|&(start, end)| whole.start() >= start && whole.start() < end) {
                continue;
            }

            let name_match = tag.get(1).expect("tag name group");
            let tag_name = name_match.as_str().to_ascii_lowercase();
            if tables.knows_element(&tag_name) {
                let (line, column) = index.position(name_match.start());
                out.push(Occurrence::new(
                    OccurrenceKind::Element,
                    tag_name,
                    file.as_str(),
                    line,
                    column,
                ));
            }

            let Some(attrs) = tag.get(2) else { continue };
            for attr in ATTRIBUTE.captures_iter(attrs.as_str()) {
                let attr_match = attr.get(1).expect("attribute name group");
                let attr_name = attr_match.as_str().to_ascii_lowercase();
                if tables.knows_attribute(&attr_name) {
                    let (line, column) = index.position(attrs.start() + attr_match.start());
                    out.push(
                        Occurrence::new(
                            OccurrenceKind::Attribute,
                            attr_name,
                            file.as_str(),
                            line,
                            column,
                        )
                        .with_context(format!("<{}>", name_match.as_str().to_ascii_lowercase())),
                    );
                }
            }
        }
        out
    }
}

impl Default for MarkupScanner {
    fn default() -> Self {
        Self::new()
    }
}
