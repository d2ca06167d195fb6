//! Tolerant style-sheet scanner.
//!
//! A hand-rolled block walker with just enough structure to extract
//! declarations, at-rules, pseudo-selectors, CSS functions, and
//! custom-property usage with positions. Not a CSS parser: a malformed
//! rule (missing colon, stray terminator, unterminated block) skips to the
//! next recovery point and scanning continues with the rest of the file.

use std::path::Path;

use crate::types::{Occurrence, OccurrenceKind};

/// At-rules whose block contains nested rules rather than declarations
const GROUP_AT_RULES: &[&str] = &[
    "media",
    "supports",
    "container",
    "layer",
    "scope",
    "starting-style",
    "keyframes",
    "document",
];

pub struct StylesheetScanner;

impl StylesheetScanner {
    pub fn new() -> Self {
        Self
    }

    /// Walk the sheet and return occurrences in document order.
    /// Total: never fails, empty or comment-only input yields an empty list.
    pub fn detect(&self, text: &str, path: &Path) -> Vec<Occurrence> {
        let file = path.display().to_string();
        let mut walker = Walker::new(text, &file);
        walker.rule_list(false);
        walker.out
    }
}

impl Default for StylesheetScanner {
    fn default() -> Self {
        Self::new()
    }
}

struct Walker<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,
    file: &'a str,
    out: Vec<Occurrence>,
}

impl<'a> Walker<'a> {
    fn new(text: &str, file: &'a str) -> Self {
        Self { chars: text.chars().collect(), pos: 0, line: 1, col: 1, file, out: Vec::new() }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn mark(&self) -> (u32, u32) {
        (self.line, self.col)
    }

    fn emit(&mut self, kind: OccurrenceKind, name: String, at: (u32, u32)) {
        self.out.push(Occurrence::new(kind, name, self.file, at.0, at.1));
    }

    /// Skip whitespace and comments; unterminated comments run to EOF
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_next() == Some('*') => {
                    self.bump();
                    self.bump();
                    while !self.eof() {
                        if self.peek() == Some('*') && self.peek_next() == Some('/') {
                            self.bump();
                            self.bump();
                            break;
                        }
                        self.bump();
                    }
                }
                _ => return,
            }
        }
    }

    /// Consume a quoted string (opening quote at cursor), returning its
    /// raw text including quotes. Unterminated strings run to EOF.
    fn consume_string(&mut self) -> String {
        let mut raw = String::new();
        let Some(quote) = self.bump() else { return raw };
        raw.push(quote);
        while let Some(ch) = self.peek() {
            if ch == '\\' {
                raw.push(self.bump().unwrap_or('\\'));
                if let Some(escaped) = self.bump() {
                    raw.push(escaped);
                }
                continue;
            }
            raw.push(self.bump().unwrap_or(quote));
            if ch == quote {
                break;
            }
        }
        raw
    }

    fn read_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ident.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        ident
    }

    /// Parse a run of rules. `nested` decides whether `}` closes this list
    /// or is a stray terminator to skip past.
    fn rule_list(&mut self, nested: bool) {
        loop {
            self.skip_trivia();
            match self.peek() {
                None => return,
                Some('}') => {
                    self.bump();
                    if nested {
                        return;
                    }
                    // stray close brace at the top level - skip it
                }
                Some('@') => self.at_rule(),
                Some(_) => self.qualified_rule(),
            }
        }
    }

    fn at_rule(&mut self) {
        let at = self.mark();
        self.bump(); // '@'
        let name = self.read_ident();
        if !name.is_empty() {
            self.emit(OccurrenceKind::AtRule, name.clone(), at);
        }

        // prelude until `;` or `{`; `}` here means a malformed rule whose
        // close belongs to the enclosing block
        let mut paren_depth = 0u32;
        loop {
            match self.peek() {
                None => return,
                Some(';') if paren_depth == 0 => {
                    self.bump();
                    return;
                }
                Some('}') if paren_depth == 0 => return,
                Some('{') if paren_depth == 0 => {
                    self.bump();
                    let lowered = name.to_ascii_lowercase();
                    if GROUP_AT_RULES.contains(&lowered.as_str()) {
                        self.rule_list(true);
                    } else {
                        let context = format!("@{name}");
                        self.declaration_block(&context);
                    }
                    return;
                }
                Some('(') => {
                    paren_depth += 1;
                    self.bump();
                }
                Some(')') => {
                    paren_depth = paren_depth.saturating_sub(1);
                    self.bump();
                }
                Some('"') | Some('\'') => {
                    self.consume_string();
                }
                Some('/') if self.peek_next() == Some('*') => self.skip_trivia(),
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Selector prelude followed by a declaration block. A prelude hitting
    /// `;` is a malformed rule and is skipped whole.
    fn qualified_rule(&mut self) {
        let mut prelude = String::new();
        loop {
            match self.peek() {
                None => return,
                Some(';') => {
                    self.bump();
                    return;
                }
                Some('}') => return,
                Some('{') => {
                    self.bump();
                    let context = prelude.trim().to_string();
                    self.declaration_block(&context);
                    return;
                }
                Some('"') | Some('\'') => {
                    prelude.push_str(&self.consume_string());
                }
                Some('/') if self.peek_next() == Some('*') => self.skip_trivia(),
                Some(':') => {
                    let at = self.mark();
                    prelude.push(self.bump().unwrap_or(':'));
                    let double = self.peek() == Some(':');
                    if double {
                        prelude.push(self.bump().unwrap_or(':'));
                    }
                    let ident = self.read_ident();
                    if !ident.is_empty() {
                        prelude.push_str(&ident);
                        let name =
                            if double { format!("::{ident}") } else { format!(":{ident}") };
                        self.emit(OccurrenceKind::Selector, name, at);
                    }
                }
                Some(_) => {
                    prelude.push(self.bump().unwrap_or(' '));
                }
            }
        }
    }

    /// Declarations inside `{ ... }`. Each recovers independently: a
    /// declaration without a colon is skipped, a nested block is walked as
    /// a nested rule, EOF ends the block as if it were closed.
    fn declaration_block(&mut self, context: &str) {
        loop {
            self.skip_trivia();
            match self.peek() {
                None => return,
                Some('}') => {
                    self.bump();
                    return;
                }
                Some(_) => {}
            }

            let at = self.mark();
            let mut name = String::new();
            loop {
                match self.peek() {
                    None | Some(':') | Some(';') | Some('{') | Some('}') => break,
                    Some('"') | Some('\'') => {
                        self.consume_string();
                    }
                    Some('/') if self.peek_next() == Some('*') => self.skip_trivia(),
                    Some(_) => name.push(self.bump().unwrap_or(' ')),
                }
            }

            match self.peek() {
                None => return,
                // no colon before the terminator: malformed, skip the chunk
                Some(';') => {
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    return;
                }
                // nested rule (CSS nesting) - walk it with its own context
                Some('{') => {
                    self.bump();
                    let child = name.trim().to_string();
                    self.declaration_block(&child);
                }
                Some(':') => {
                    self.bump();
                    self.declaration_value(name.trim(), context, at);
                }
                _ => unreachable!("peek covered above"),
            }
        }
    }

    /// Value of one declaration. Emits the property occurrence plus any
    /// function and `var()` occurrences found in the value.
    fn declaration_value(&mut self, property: &str, context: &str, at: (u32, u32)) {
        let mut value = String::new();
        let mut fn_ident = String::new();
        let mut fn_at = self.mark();
        let mut paren_depth = 0u32;
        let mut abandoned = false;
        let mut pending: Vec<Occurrence> = Vec::new();

        loop {
            match self.peek() {
                None => break,
                Some(';') if paren_depth == 0 => {
                    self.bump();
                    break;
                }
                Some('}') if paren_depth == 0 => break,
                // `{` here means the "declaration" was really a nested rule
                // prelude (`&:hover {`); walk the block and emit nothing
                Some('{') if paren_depth == 0 => {
                    self.bump();
                    let child = format!("{property}:{value}");
                    self.declaration_block(child.trim());
                    abandoned = true;
                    break;
                }
                Some('"') | Some('\'') => {
                    fn_ident.clear();
                    value.push_str(&self.consume_string());
                }
                Some('/') if self.peek_next() == Some('*') => self.skip_trivia(),
                Some('(') => {
                    if !fn_ident.is_empty() {
                        let lowered = fn_ident.to_ascii_lowercase();
                        self.bump();
                        value.push('(');
                        paren_depth += 1;
                        if lowered == "var" {
                            let arg = self.var_argument(&mut value);
                            let mut occ = Occurrence::new(
                                OccurrenceKind::Value,
                                "var",
                                self.file,
                                fn_at.0,
                                fn_at.1,
                            );
                            if !arg.is_empty() {
                                occ = occ.with_value(arg);
                            }
                            pending.push(occ);
                        } else {
                            pending.push(Occurrence::new(
                                OccurrenceKind::Function,
                                lowered,
                                self.file,
                                fn_at.0,
                                fn_at.1,
                            ));
                        }
                        fn_ident.clear();
                    } else {
                        self.bump();
                        value.push('(');
                        paren_depth += 1;
                    }
                }
                Some(')') => {
                    fn_ident.clear();
                    paren_depth = paren_depth.saturating_sub(1);
                    self.bump();
                    value.push(')');
                }
                Some(ch) if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' => {
                    if fn_ident.is_empty() {
                        fn_at = self.mark();
                    }
                    fn_ident.push(ch);
                    self.bump();
                    value.push(ch);
                }
                Some(ch) => {
                    fn_ident.clear();
                    self.bump();
                    value.push(ch);
                }
            }
        }

        if abandoned {
            return;
        }

        if is_property_name(property) && !property.starts_with("--") {
            let mut occ = Occurrence::new(
                OccurrenceKind::Property,
                property.to_string(),
                self.file,
                at.0,
                at.1,
            )
            .with_value(value.trim().to_string());
            if !context.is_empty() {
                occ = occ.with_context(context.to_string());
            }
            self.out.push(occ);
        }
        // functions come after the declaration they appear in
        self.out.extend(pending);
    }

    /// Read the custom-property name after `var(`, appending consumed
    /// chars to the value buffer
    fn var_argument(&mut self, value: &mut String) -> String {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                value.push(self.bump().unwrap_or(' '));
            } else {
                break;
            }
        }
        let mut arg = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                arg.push(ch);
                value.push(self.bump().unwrap_or(ch));
            } else {
                break;
            }
        }
        arg
    }
}

fn is_property_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '-' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OccurrenceKind;
    use std::path::Path;

    fn scan(css: &str) -> Vec<Occurrence> {
        StylesheetScanner::new().detect(css, Path::new("styles.css"))
    }

    #[test]
    fn empty_and_comment_only_input_yield_nothing() {
        assert!(scan("").is_empty());
        assert!(scan("   \n\t  ").is_empty());
        assert!(scan("/* just a comment */").is_empty());
        assert!(scan("/* unterminated comment").is_empty());
    }

    #[test]
    fn declarations_carry_value_and_context() {
        let occurrences = scan(".container { display: grid; gap: 20px; }");

        let display = occurrences
            .iter()
            .find(|o| o.kind == OccurrenceKind::Property && o.name == "display")
            .unwrap();
        assert_eq!(display.associated_value.as_deref(), Some("grid"));
        assert_eq!(display.enclosing_context.as_deref(), Some(".container"));
        assert_eq!(display.line, 1);

        let gap = occurrences
            .iter()
            .find(|o| o.kind == OccurrenceKind::Property && o.name == "gap")
            .unwrap();
        assert_eq!(gap.associated_value.as_deref(), Some("20px"));
    }

    #[test]
    fn positions_are_one_based_and_track_lines() {
        let occurrences = scan("a {\n  color: red;\n  gap: 4px;\n}");
        let gap = occurrences.iter().find(|o| o.name == "gap").unwrap();
        assert_eq!((gap.line, gap.column), (3, 3));
    }

    #[test]
    fn malformed_rules_never_abort_the_file() {
        let css = ".broken { color: red missing: semicolon; display grid; }\n\
                   .unclosed { background: blue;";
        let occurrences = scan(css);

        // `display grid;` has no colon and is skipped; the unterminated
        // rule still yields its background declaration
        assert!(occurrences.iter().any(|o| o.name == "color"));
        assert!(occurrences.iter().any(|o| o.name == "background"));
        assert!(!occurrences.iter().any(|o| o.name == "display"));
    }

    #[test]
    fn later_rules_survive_an_earlier_malformed_rule() {
        let css = ".bad { oops }\n.good { gap: 8px; }";
        let occurrences = scan(css);
        assert!(occurrences.iter().any(|o| o.name == "gap"));
    }

    #[test]
    fn var_usage_is_a_distinct_occurrence() {
        let occurrences = scan(".a { color: var(--brand, blue); }");

        let var_use = occurrences.iter().find(|o| o.kind == OccurrenceKind::Value).unwrap();
        assert_eq!(var_use.name, "var");
        assert_eq!(var_use.associated_value.as_deref(), Some("--brand"));

        // the declared property is still recorded independently
        assert!(occurrences
            .iter()
            .any(|o| o.kind == OccurrenceKind::Property && o.name == "color"));
    }

    #[test]
    fn custom_property_declarations_emit_no_property_occurrence() {
        let occurrences = scan(":root { --brand: oklch(70% 0.1 250); }");
        assert!(!occurrences.iter().any(|o| o.kind == OccurrenceKind::Property));
        // but the function in its value is still seen
        assert!(occurrences
            .iter()
            .any(|o| o.kind == OccurrenceKind::Function && o.name == "oklch"));
    }

    #[test]
    fn functions_in_values_are_recorded() {
        let occurrences = scan(".a { width: clamp(1rem, 2vw, 3rem); }");
        let clamp = occurrences.iter().find(|o| o.kind == OccurrenceKind::Function).unwrap();
        assert_eq!(clamp.name, "clamp");
    }

    #[test]
    fn pseudo_selectors_are_recorded_with_colons() {
        let occurrences = scan(".card:has(img):focus-visible::backdrop { color: red; }");
        let names: Vec<&str> = occurrences
            .iter()
            .filter(|o| o.kind == OccurrenceKind::Selector)
            .map(|o| o.name.as_str())
            .collect();
        assert!(names.contains(&":has"));
        assert!(names.contains(&":focus-visible"));
        assert!(names.contains(&"::backdrop"));
    }

    #[test]
    fn at_rules_recurse_into_group_bodies() {
        let css = "@media (min-width: 600px) { .a { gap: 1rem; } }\n@layer base;";
        let occurrences = scan(css);

        let at_rules: Vec<&str> = occurrences
            .iter()
            .filter(|o| o.kind == OccurrenceKind::AtRule)
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(at_rules, vec!["media", "layer"]);

        // declarations inside the media block are still scanned
        assert!(occurrences.iter().any(|o| o.name == "gap"));
    }

    #[test]
    fn declaration_at_rules_parse_their_block_as_declarations() {
        let occurrences = scan("@font-face { font-family: \"Inter\"; src: url(inter.woff2); }");
        let src = occurrences
            .iter()
            .find(|o| o.kind == OccurrenceKind::Property && o.name == "src")
            .unwrap();
        assert_eq!(src.enclosing_context.as_deref(), Some("@font-face"));
    }

    #[test]
    fn nested_rules_are_walked_not_misread() {
        let css = ".card { gap: 4px; &:hover { backdrop-filter: blur(2px); } }";
        let occurrences = scan(css);
        assert!(occurrences.iter().any(|o| o.name == "gap"));
        assert!(occurrences.iter().any(|o| o.name == "backdrop-filter"));
    }

    #[test]
    fn strings_do_not_confuse_the_walker() {
        let css = ".a { content: \"} ; : {\"; gap: 2px; }";
        let occurrences = scan(css);
        assert!(occurrences.iter().any(|o| o.name == "gap"));
    }

    #[test]
    fn scanning_is_deterministic() {
        let css = ".a:has(b) { display: grid; width: min(10px, 2vw); }";
        assert_eq!(scan(css), scan(css));
    }
}
