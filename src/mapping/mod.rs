//! Canonical feature mapping.
//!
//! Occurrences are resolved to canonical feature identifiers through
//! immutable lookup tables loaded once before any scan:
//!
//! 1. **Value-keyed lookup**: exact `(property, value)` pair in a
//!    value-keyed sub-table (most specific)
//! 2. **Direct lookup**: `name -> featureId` for the name alone
//! 3. **No match**: the occurrence is silently excluded - a mapping miss
//!    is expected and common, not an error
//!
//! Tables are shared read-only across all scans and all files; no write
//! path exists after load, so reads need no locking.

mod resolver;
mod tables;

pub use resolver::resolve;
pub use tables::{MapEntry, MappingTables};

#[cfg(test)]
mod tests;
