//! Immutable feature mapping tables.
//!
//! Entries whose shape varies per key are modeled as a tagged variant
//! (`Direct` vs `ByValue`) resolved by explicit case analysis. The builtin
//! tables cover the commonly scanned web-platform surface; deployments
//! tracking a different feature set load their own YAML document.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::{Result, ScanError};

/// One property-table entry: either a direct canonical feature id, or a
/// secondary table keyed by the declaration value with an optional direct
/// fallback for values without a specific entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapEntry {
    Direct(String),
    ByValue {
        values: FxHashMap<String, String>,
        fallback: Option<String>,
    },
}

/// Raw YAML shape for a property entry - a bare string or a
/// `{values: {...}, fallback: ...}` map
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Direct(String),
    ByValue {
        values: BTreeMap<String, String>,
        #[serde(default)]
        fallback: Option<String>,
    },
}

#[derive(Debug, Deserialize, Default)]
struct RawMappingDoc {
    #[serde(default)]
    properties: BTreeMap<String, RawEntry>,
    #[serde(default)]
    selectors: BTreeMap<String, String>,
    #[serde(default)]
    functions: BTreeMap<String, String>,
    #[serde(default, alias = "at_rules")]
    at_rules: BTreeMap<String, String>,
    #[serde(default, alias = "apis")]
    api_names: BTreeMap<String, String>,
    #[serde(default)]
    elements: BTreeMap<String, String>,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

/// Independent, immutable, process-lifetime lookup tables.
///
/// Loaded once before any scan and shared read-only across scans and files.
#[derive(Debug, Clone, Default)]
pub struct MappingTables {
    pub(crate) properties: FxHashMap<String, MapEntry>,
    pub(crate) selectors: FxHashMap<String, String>,
    pub(crate) functions: FxHashMap<String, String>,
    pub(crate) at_rules: FxHashMap<String, String>,
    pub(crate) api_names: FxHashMap<String, String>,
    pub(crate) elements: FxHashMap<String, String>,
    pub(crate) attributes: FxHashMap<String, String>,
}

impl MappingTables {
    /// Empty tables for testing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builtin tables covering the commonly scanned web-platform surface
    pub fn builtin() -> Self {
        let mut tables = Self::empty();

        for (name, id) in PROPERTY_DIRECT {
            tables.properties.insert((*name).to_string(), MapEntry::Direct((*id).to_string()));
        }
        for (name, pairs, fallback) in PROPERTY_BY_VALUE {
            let values = pairs
                .iter()
                .map(|(value, id)| ((*value).to_string(), (*id).to_string()))
                .collect();
            tables.properties.insert(
                (*name).to_string(),
                MapEntry::ByValue { values, fallback: fallback.map(str::to_string) },
            );
        }
        for (name, id) in SELECTORS {
            tables.selectors.insert((*name).to_string(), (*id).to_string());
        }
        for (name, id) in FUNCTIONS {
            tables.functions.insert((*name).to_string(), (*id).to_string());
        }
        for (name, id) in AT_RULES {
            tables.at_rules.insert((*name).to_string(), (*id).to_string());
        }
        for (name, id) in API_NAMES {
            tables.api_names.insert((*name).to_string(), (*id).to_string());
        }
        for (name, id) in ELEMENTS {
            tables.elements.insert((*name).to_string(), (*id).to_string());
        }
        for (name, id) in ATTRIBUTES {
            tables.attributes.insert((*name).to_string(), (*id).to_string());
        }

        tables
    }

    /// Load tables from a YAML document.
    ///
    /// Missing sections default to empty; a deployment can override only
    /// the tables it cares about and merge the rest from `builtin()`.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let raw: RawMappingDoc = serde_yaml::from_str(yaml)
            .map_err(|e| ScanError::table_load(format!("failed to parse mapping YAML: {e}")))?;

        let mut tables = Self::empty();
        for (name, entry) in raw.properties {
            let entry = match entry {
                RawEntry::Direct(id) => MapEntry::Direct(id),
                RawEntry::ByValue { values, fallback } => MapEntry::ByValue {
                    values: values.into_iter().collect(),
                    fallback,
                },
            };
            tables.properties.insert(name.to_ascii_lowercase(), entry);
        }
        tables.selectors = lower_keys(raw.selectors);
        tables.functions = lower_keys(raw.functions);
        tables.at_rules = lower_keys(raw.at_rules);
        // API names are case-sensitive (IntersectionObserver vs fetch)
        tables.api_names = raw.api_names.into_iter().collect();
        tables.elements = lower_keys(raw.elements);
        tables.attributes = lower_keys(raw.attributes);
        Ok(tables)
    }

    /// True if the script-side name table knows this API or syntax name
    pub(crate) fn knows_api(&self, name: &str) -> bool {
        self.api_names.contains_key(name)
    }

    /// True if the markup table knows this element name
    pub(crate) fn knows_element(&self, name: &str) -> bool {
        self.elements.contains_key(name)
    }

    /// True if the markup table knows this attribute name
    pub(crate) fn knows_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
            && self.selectors.is_empty()
            && self.functions.is_empty()
            && self.at_rules.is_empty()
            && self.api_names.is_empty()
            && self.elements.is_empty()
            && self.attributes.is_empty()
    }
}

fn lower_keys(map: BTreeMap<String, String>) -> FxHashMap<String, String> {
    map.into_iter().map(|(k, v)| (k.to_ascii_lowercase(), v)).collect()
}

// ============================================================================
// Builtin table data
// ============================================================================

const PROPERTY_DIRECT: &[(&str, &str)] = &[
    ("accent-color", "accent-color"),
    ("anchor-name", "anchor-positioning"),
    ("aspect-ratio", "aspect-ratio"),
    ("backdrop-filter", "backdrop-filter"),
    ("column-gap", "flexbox-gap"),
    ("container", "container-queries"),
    ("container-name", "container-queries"),
    ("container-type", "container-queries"),
    ("content-visibility", "content-visibility"),
    ("field-sizing", "field-sizing"),
    ("gap", "flexbox-gap"),
    ("grid-area", "grid"),
    ("grid-template-areas", "grid"),
    ("grid-template-columns", "grid"),
    ("grid-template-rows", "grid"),
    ("offset-path", "motion-path"),
    ("overscroll-behavior", "overscroll-behavior"),
    ("position-anchor", "anchor-positioning"),
    ("row-gap", "flexbox-gap"),
    ("scroll-snap-align", "scroll-snap"),
    ("scroll-snap-type", "scroll-snap"),
    ("scrollbar-color", "scrollbar-color"),
    ("scrollbar-gutter", "scrollbar-gutter"),
    ("view-transition-name", "view-transitions"),
];

type ByValueRow = (&'static str, &'static [(&'static str, &'static str)], Option<&'static str>);

const PROPERTY_BY_VALUE: &[ByValueRow] = &[
    (
        "display",
        &[
            ("grid", "grid"),
            ("inline-grid", "grid"),
            ("flex", "flexbox"),
            ("inline-flex", "flexbox"),
            ("contents", "display-contents"),
        ],
        None,
    ),
    ("position", &[("sticky", "sticky-positioning")], None),
    (
        "text-wrap",
        &[("balance", "text-wrap-balance"), ("pretty", "text-wrap-pretty")],
        Some("text-wrap"),
    ),
    ("overflow", &[("clip", "overflow-clip")], None),
];

const SELECTORS: &[(&str, &str)] = &[
    (":dir", "dir"),
    (":focus-visible", "focus-visible"),
    (":focus-within", "focus-within"),
    (":has", "has"),
    (":is", "is"),
    (":modal", "modal"),
    (":popover-open", "popover"),
    (":user-invalid", "user-valid-invalid"),
    (":user-valid", "user-valid-invalid"),
    (":where", "where"),
    ("::backdrop", "backdrop"),
    ("::marker", "marker"),
    ("::view-transition", "view-transitions"),
];

const FUNCTIONS: &[(&str, &str)] = &[
    ("clamp", "min-max-clamp"),
    ("color-mix", "color-mix"),
    ("env", "environment-variables"),
    ("image-set", "image-set"),
    ("lab", "lab-lch"),
    ("lch", "lab-lch"),
    ("light-dark", "light-dark"),
    ("max", "min-max-clamp"),
    ("min", "min-max-clamp"),
    ("minmax", "grid"),
    ("oklab", "oklch-oklab"),
    ("oklch", "oklch-oklab"),
    ("var", "custom-properties"),
];

const AT_RULES: &[(&str, &str)] = &[
    ("container", "container-queries"),
    ("keyframes", "css-animations"),
    ("layer", "cascade-layers"),
    ("media", "media-queries"),
    ("property", "registered-custom-properties"),
    ("scope", "scope"),
    ("starting-style", "starting-style"),
    ("supports", "supports"),
];

const API_NAMES: &[(&str, &str)] = &[
    // Global API references
    ("AbortController", "abort-controller"),
    ("BroadcastChannel", "broadcast-channel"),
    ("EventSource", "server-sent-events"),
    ("IntersectionObserver", "intersection-observer"),
    ("MutationObserver", "mutation-observer"),
    ("OffscreenCanvas", "offscreen-canvas"),
    ("ReadableStream", "streams"),
    ("ResizeObserver", "resize-observer"),
    ("SharedWorker", "shared-workers"),
    ("TransformStream", "streams"),
    ("URLPattern", "url-pattern"),
    ("WebSocket", "websockets"),
    ("Worker", "dedicated-workers"),
    ("WritableStream", "streams"),
    ("caches", "cache-storage"),
    ("crypto.subtle", "web-crypto"),
    ("customElements", "custom-elements"),
    ("document.startViewTransition", "view-transitions"),
    ("fetch", "fetch"),
    ("indexedDB", "indexeddb"),
    ("localStorage", "storage"),
    ("navigator.clipboard", "async-clipboard"),
    ("navigator.gpu", "webgpu"),
    ("navigator.locks", "web-locks"),
    ("navigator.serviceWorker", "service-workers"),
    ("navigator.share", "web-share"),
    ("requestIdleCallback", "request-idle-callback"),
    ("sessionStorage", "storage"),
    ("structuredClone", "structured-clone"),
    // Syntax shapes, named by the scanner
    ("class-static-blocks", "class-static-blocks"),
    ("destructuring", "destructuring"),
    ("nullish-coalescing", "nullish-coalescing"),
    ("optional-chaining", "optional-chaining"),
    ("private-class-members", "private-class-members"),
    ("spread", "spread"),
    ("template-literals", "template-literals"),
];

const ELEMENTS: &[(&str, &str)] = &[
    ("datalist", "datalist"),
    ("details", "details"),
    ("dialog", "dialog"),
    ("meter", "meter"),
    ("picture", "picture"),
    ("search", "search-element"),
    ("slot", "slot"),
    ("summary", "details"),
    ("template", "template"),
];

const ATTRIBUTES: &[(&str, &str)] = &[
    ("decoding", "image-decoding"),
    ("enterkeyhint", "enterkeyhint"),
    ("fetchpriority", "fetch-priority"),
    ("inert", "inert"),
    ("loading", "loading-lazy"),
    ("popover", "popover"),
    ("popovertarget", "popover"),
];
