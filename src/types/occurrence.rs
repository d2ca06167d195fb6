use serde::{Deserialize, Serialize};

/// Kind of syntax occurrence - which recognition family produced it
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum OccurrenceKind {
    /// CSS declaration property (`display: grid` -> `display`)
    Property,
    /// Value-level construct; custom-property usage via `var(...)`
    Value,
    /// Pseudo-class or pseudo-element in a rule prelude (`:has`, `::backdrop`)
    Selector,
    /// CSS function inside a declaration value (`clamp(...)`, `color-mix(...)`)
    Function,
    /// At-rule name (`@container`, `@layer`)
    AtRule,
    /// Global API referenced from script (`fetch`, `navigator.locks`)
    ApiReference,
    /// Script syntax shape (optional chaining, nullish coalescing, ...)
    Syntax,
    /// Markup element name (`<dialog>`)
    Element,
    /// Markup attribute name (`loading="lazy"`)
    Attribute,
}

/// One syntactic appearance of a candidate feature in scanned text.
///
/// Created fresh per scan, never mutated, discarded after resolution.
/// Line and column are 1-based.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub kind: OccurrenceKind,
    /// Name as written in the source (properties are lowercased on lookup,
    /// not here)
    pub name: String,
    /// Declaration value, `var()` argument, or other associated payload
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub associated_value: Option<String>,
    pub file: String,
    pub line: u32,
    pub column: u32,
    /// Rule prelude or other enclosing construct, when one exists
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub enclosing_context: Option<String>,
}

impl Occurrence {
    pub fn new<N: Into<String>, F: Into<String>>(
        kind: OccurrenceKind,
        name: N,
        file: F,
        line: u32,
        column: u32,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            associated_value: None,
            file: file.into(),
            line,
            column,
            enclosing_context: None,
        }
    }

    pub fn with_value<S: Into<String>>(mut self, value: S) -> Self {
        self.associated_value = Some(value.into());
        self
    }

    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.enclosing_context = Some(context.into());
        self
    }
}
