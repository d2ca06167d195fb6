//! Source scanners - one per scanned format.
//!
//! Each scanner turns raw text into an ordered list of syntax occurrences
//! with position info. Scanners are deterministic, side-effect-free, and
//! total: malformed input never aborts a file, and a file that cannot be
//! parsed at all yields a recoverable error that the batch layer downgrades
//! to a warning. Empty and comment-only input yield an empty list.

pub mod markup;
pub mod position;
pub mod script;
pub mod stylesheet;


use std::path::Path;

use crate::error::Result;
use crate::mapping::MappingTables;
use crate::types::Occurrence;

pub use markup::MarkupScanner;
pub use script::ScriptScanner;
pub use stylesheet::StylesheetScanner;

/// Source format, routed by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Stylesheet,
    Script,
    Markup,
    Unknown,
}

/// Route a path to a scanner by extension.
///
/// Unknown kinds scan to an empty occurrence list rather than erroring -
/// the loader decides what to feed the pipeline, not the core.
pub fn detect_source_kind(path: &Path) -> SourceKind {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return SourceKind::Unknown;
    };
    match ext.to_ascii_lowercase().as_str() {
        "css" => SourceKind::Stylesheet,
        "js" | "mjs" | "cjs" | "jsx" | "ts" | "tsx" => SourceKind::Script,
        "html" | "htm" => SourceKind::Markup,
        _ => SourceKind::Unknown,
    }
}

/// Detect feature occurrences in one source file.
///
/// Never fails: a script parse failure is logged and yields an empty list.
/// Use [`detect_features_checked`] when the caller wants the recoverable
/// error for warning bookkeeping.
pub fn detect_features(text: &str, path: &Path, tables: &MappingTables) -> Vec<Occurrence> {
    detect_features_checked(text, path, tables).unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), error = %err, "scan degraded to empty occurrence list");
        Vec::new()
    })
}

/// Detect feature occurrences, surfacing the recoverable per-file error.
///
/// The only error path is a script parse failure; stylesheet and markup
/// scanning are total.
pub fn detect_features_checked(
    text: &str,
    path: &Path,
    tables: &MappingTables,
) -> Result<Vec<Occurrence>> {
    match detect_source_kind(path) {
        SourceKind::Stylesheet => Ok(StylesheetScanner::new().detect(text, path)),
        SourceKind::Script => ScriptScanner::new().scan(text, path, tables),
        SourceKind::Markup => Ok(MarkupScanner::new().detect(text, path, tables)),
        SourceKind::Unknown => Ok(Vec::new()),
    }
}
