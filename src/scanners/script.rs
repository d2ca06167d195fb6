//! Script scanner backed by tree-sitter.
//!
//! Detects two independent occurrence families: global API references
//! (call / constructor / member heads matched against the API name table)
//! and syntax-shape features (optional chaining, nullish coalescing,
//! private class members, static blocks, destructuring, template literals,
//! spread). Parsing is guarded with `catch_unwind`; a parse failure is a
//! recoverable error for this file only and never aborts a batch.

use std::cell::RefCell;
use std::path::Path;

use tracing::{debug, warn};
use tree_sitter::{Node, Parser};

use crate::error::{Result, ScanError};
use crate::mapping::MappingTables;
use crate::types::{Occurrence, OccurrenceKind};

/// Longest member-expression text worth a table lookup
const MAX_API_PATH_LEN: usize = 80;

pub struct ScriptScanner {
    parser: RefCell<Parser>,
}

impl ScriptScanner {
    pub fn new() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .expect("JavaScript grammar is compatible with the linked tree-sitter");
        Self { parser: RefCell::new(parser) }
    }

    /// Scan one script. The `Err` path is a recoverable parse failure
    /// (tree-sitter returned no tree, or panicked on hostile input) that
    /// yields an empty occurrence list for this file only.
    pub fn scan(&self, text: &str, path: &Path, tables: &MappingTables) -> Result<Vec<Occurrence>> {
        let file = path.display().to_string();
        debug!(path = %file, bytes = text.len(), "parsing script");

        let parse_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.parser.borrow_mut().parse(text, None)
        }));

        let tree = match parse_result {
            Ok(Some(tree)) => tree,
            Ok(None) => {
                return Err(ScanError::parse(file, "parser returned no tree"));
            }
            Err(_) => {
                warn!(path = %file, "tree-sitter panicked while parsing");
                return Err(ScanError::parse(file, "parser panicked"));
            }
        };

        let mut out = Vec::new();
        walk(tree.root_node(), text.as_bytes(), &file, tables, &mut out);
        Ok(out)
    }
}

impl Default for ScriptScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterative depth-first traversal; no recursion, so deeply nested
/// (minified) sources cannot overflow the stack
fn walk(root: Node<'_>, source: &[u8], file: &str, tables: &MappingTables, out: &mut Vec<Occurrence>) {
    let mut cursor = root.walk();
    loop {
        inspect_node(cursor.node(), source, file, tables, out);

        if cursor.goto_first_child() {
            continue;
        }
        if cursor.goto_next_sibling() {
            continue;
        }
        loop {
            if !cursor.goto_parent() {
                return;
            }
            if cursor.goto_next_sibling() {
                break;
            }
        }
    }
}

fn inspect_node(
    node: Node<'_>,
    source: &[u8],
    file: &str,
    tables: &MappingTables,
    out: &mut Vec<Occurrence>,
) {
    match node.kind() {
        "call_expression" => {
            if let Some(callee) = node.child_by_field_name("function") {
                if callee.kind() == "identifier" {
                    flag_api(callee, source, file, tables, out);
                }
            }
            flag_optional_chain(node, source, file, out);
        }
        "new_expression" => {
            if let Some(ctor) = node.child_by_field_name("constructor") {
                if ctor.kind() == "identifier" {
                    flag_api(ctor, source, file, tables, out);
                }
            }
        }
        "member_expression" => {
            flag_member_api(node, source, file, tables, out);
            flag_optional_chain(node, source, file, out);
        }
        "subscript_expression" => {
            flag_optional_chain(node, source, file, out);
        }
        "binary_expression" => {
            if operator_text(node, source) == Some("??") {
                emit_syntax(node, "nullish-coalescing", file, out);
            }
        }
        "augmented_assignment_expression" => {
            if operator_text(node, source) == Some("??=") {
                emit_syntax(node, "nullish-coalescing", file, out);
            }
        }
        "template_string" => emit_syntax(node, "template-literals", file, out),
        "spread_element" => emit_syntax(node, "spread", file, out),
        "object_pattern" | "array_pattern" => emit_syntax(node, "destructuring", file, out),
        "class_static_block" => emit_syntax(node, "class-static-blocks", file, out),
        "private_property_identifier" => {
            emit_syntax(node, "private-class-members", file, out);
        }
        _ => {}
    }
}

/// Bare identifier head (`fetch(...)`, `new Worker(...)`)
fn flag_api(
    node: Node<'_>,
    source: &[u8],
    file: &str,
    tables: &MappingTables,
    out: &mut Vec<Occurrence>,
) {
    let Ok(text) = node.utf8_text(source) else { return };
    if tables.knows_api(text) {
        out.push(api_occurrence(text, node, file));
    }
}

/// Dotted head (`navigator.locks`, `window.localStorage.setItem`).
///
/// The full normalized path is tried first; when the object side is a bare
/// identifier it is tried too, so `localStorage.setItem` matches the
/// `localStorage` table entry. Nested member expressions are visited by
/// the traversal on their own, which covers deeper paths.
fn flag_member_api(
    node: Node<'_>,
    source: &[u8],
    file: &str,
    tables: &MappingTables,
    out: &mut Vec<Occurrence>,
) {
    let Ok(raw) = node.utf8_text(source) else { return };
    if raw.len() <= MAX_API_PATH_LEN && is_dotted_path(raw) {
        let normalized = strip_global_prefix(raw);
        if tables.knows_api(normalized) {
            out.push(api_occurrence(normalized, node, file));
            return;
        }
    }

    if let Some(object) = node.child_by_field_name("object") {
        if object.kind() == "identifier" {
            if let Ok(name) = object.utf8_text(source) {
                if tables.knows_api(name) {
                    out.push(api_occurrence(name, object, file));
                }
            }
        }
    }
}

fn flag_optional_chain(node: Node<'_>, source: &[u8], file: &str, out: &mut Vec<Occurrence>) {
    for i in 0..node.child_count() {
        let Some(child) = node.child(i) else { continue };
        let kind = child.kind();
        if kind == "optional_chain" || kind == "?." || child.utf8_text(source) == Ok("?.") {
            let point = child.start_position();
            out.push(Occurrence::new(
                OccurrenceKind::Syntax,
                "optional-chaining",
                file,
                point.row as u32 + 1,
                point.column as u32 + 1,
            ));
            return;
        }
    }
}

fn emit_syntax(node: Node<'_>, name: &str, file: &str, out: &mut Vec<Occurrence>) {
    let point = node.start_position();
    out.push(Occurrence::new(
        OccurrenceKind::Syntax,
        name,
        file,
        point.row as u32 + 1,
        point.column as u32 + 1,
    ));
}

fn api_occurrence(name: &str, node: Node<'_>, file: &str) -> Occurrence {
    let point = node.start_position();
    Occurrence::new(
        OccurrenceKind::ApiReference,
        name,
        file,
        point.row as u32 + 1,
        point.column as u32 + 1,
    )
}

fn operator_text<'a>(node: Node<'a>, source: &'a [u8]) -> Option<&'a str> {
    node.child_by_field_name("operator")?.utf8_text(source).ok()
}

fn is_dotted_path(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '$')
}

fn strip_global_prefix(path: &str) -> &str {
    for prefix in ["window.", "globalThis.", "self."] {
        if let Some(rest) = path.strip_prefix(prefix) {
            return rest;
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingTables;
    use std::path::Path;

    fn scan(js: &str) -> Vec<Occurrence> {
        ScriptScanner::new()
            .scan(js, Path::new("app.js"), &MappingTables::builtin())
            .unwrap()
    }

    fn names(occurrences: &[Occurrence], kind: OccurrenceKind) -> Vec<&str> {
        occurrences.iter().filter(|o| o.kind == kind).map(|o| o.name.as_str()).collect()
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(scan("").is_empty());
        assert!(scan("// just a comment\n").is_empty());
    }

    #[test]
    fn global_api_calls_are_detected() {
        let occurrences = scan("const res = await fetch('/api');\nconst c = structuredClone(res);");
        let apis = names(&occurrences, OccurrenceKind::ApiReference);
        assert!(apis.contains(&"fetch"));
        assert!(apis.contains(&"structuredClone"));
    }

    #[test]
    fn constructor_references_are_detected() {
        let occurrences = scan("const io = new IntersectionObserver(cb);\nconst w = new Worker('w.js');");
        let apis = names(&occurrences, OccurrenceKind::ApiReference);
        assert!(apis.contains(&"IntersectionObserver"));
        assert!(apis.contains(&"Worker"));
    }

    #[test]
    fn dotted_api_paths_are_detected() {
        let occurrences = scan("await navigator.locks.request('sync', fn);\nlocalStorage.setItem('k', 'v');");
        let apis = names(&occurrences, OccurrenceKind::ApiReference);
        assert!(apis.contains(&"navigator.locks"));
        assert!(apis.contains(&"localStorage"));
    }

    #[test]
    fn window_prefix_is_stripped() {
        let occurrences = scan("window.localStorage.clear();");
        let apis = names(&occurrences, OccurrenceKind::ApiReference);
        assert!(apis.contains(&"localStorage"));
    }

    #[test]
    fn unknown_identifiers_are_not_flagged() {
        let occurrences = scan("doWork(); const x = myHelper.process(y);");
        assert!(names(&occurrences, OccurrenceKind::ApiReference).is_empty());
    }

    #[test]
    fn syntax_shapes_are_detected() {
        let js = r#"
            const city = user?.address?.city;
            const port = config.port ?? 8080;
            const { a, b } = payload;
            const all = [...items, extra];
            const msg = `hello ${name}`;
            class Counter {
                #count = 0;
                static { Counter.registry = new Map(); }
            }
        "#;
        let occurrences = scan(js);
        let shapes = names(&occurrences, OccurrenceKind::Syntax);
        assert!(shapes.contains(&"optional-chaining"));
        assert!(shapes.contains(&"nullish-coalescing"));
        assert!(shapes.contains(&"destructuring"));
        assert!(shapes.contains(&"spread"));
        assert!(shapes.contains(&"template-literals"));
        assert!(shapes.contains(&"private-class-members"));
        assert!(shapes.contains(&"class-static-blocks"));
    }

    #[test]
    fn each_location_is_reported_separately() {
        let occurrences = scan("fetch('/a');\nfetch('/b');");
        let fetches: Vec<_> = occurrences.iter().filter(|o| o.name == "fetch").collect();
        assert_eq!(fetches.len(), 2);
        assert_ne!(fetches[0].line, fetches[1].line);
    }

    #[test]
    fn positions_are_one_based() {
        let occurrences = scan("fetch('/a');");
        let f = occurrences.iter().find(|o| o.name == "fetch").unwrap();
        assert_eq!((f.line, f.column), (1, 1));
    }

    #[test]
    fn garbage_input_does_not_panic_or_error() {
        // tree-sitter recovers with ERROR nodes; detection degrades, the
        // call still succeeds
        let occurrences = ScriptScanner::new().scan(
            "function ((({{{ ???",
            Path::new("broken.js"),
            &MappingTables::builtin(),
        );
        assert!(occurrences.is_ok());
    }

    #[test]
    fn partial_detection_survives_syntax_errors() {
        let js = "fetch('/ok');\nfunction ((( {\n";
        let occurrences = scan(js);
        assert!(names(&occurrences, OccurrenceKind::ApiReference).contains(&"fetch"));
    }
}
