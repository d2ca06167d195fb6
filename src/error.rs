use std::io;
use std::time::Duration;
use thiserror::Error;

/// Basescan's error taxonomy.
///
/// Only configuration-time errors are batch-fatal. Everything recoverable is
/// isolated to a single file or rule, and a mapping miss is not an error at
/// all (it is an `Option::None` on the resolution path).
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("parse failure in {path}: {detail}")]
    Parse { path: String, detail: String },

    #[error("invalid policy configuration ({n} violation(s)): {list}", n = .violations.len(), list = .violations.join("; "))]
    PolicyConfig { violations: Vec<String> },

    #[error("mapping table load failed: {message}")]
    TableLoad { message: String },

    #[error("baseline dataset load failed: {message}")]
    DatasetLoad { message: String },

    #[error("upstream returned HTTP status {status}")]
    Upstream { status: u16 },

    #[error("operation timed out after {}ms", .timeout.as_millis())]
    Timeout { timeout: Duration },

    #[error("circuit '{context}' is open, failing fast")]
    CircuitOpen { context: String },

    #[error("retries exhausted after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ScanError>,
    },
}

pub type Result<T> = std::result::Result<T, ScanError>;

impl ScanError {
    pub fn parse<S1: Into<String>, S2: Into<String>>(path: S1, detail: S2) -> Self {
        Self::Parse { path: path.into(), detail: detail.into() }
    }

    pub fn policy_config(violations: Vec<String>) -> Self {
        Self::PolicyConfig { violations }
    }

    pub fn table_load<S: Into<String>>(message: S) -> Self {
        Self::TableLoad { message: message.into() }
    }

    pub fn dataset_load<S: Into<String>>(message: S) -> Self {
        Self::DatasetLoad { message: message.into() }
    }

    pub fn upstream(status: u16) -> Self {
        Self::Upstream { status }
    }

    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    pub fn circuit_open<S: Into<String>>(context: S) -> Self {
        Self::CircuitOpen { context: context.into() }
    }

    pub fn retries_exhausted(attempts: u32, source: ScanError) -> Self {
        Self::RetriesExhausted { attempts, source: Box::new(source) }
    }

    /// Returns true if the error is isolated to one file or rule and the
    /// batch can continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Default transience predicate for the resilience layer.
    ///
    /// Covers connection reset/refused/timeout I/O kinds, busy and
    /// too-many-open-files OS codes, 5xx/429 upstream responses, and
    /// deadline expiry. Permanent failures (bad configuration, parse
    /// errors, open circuits) are never transient.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io(err) => is_transient_io(err),
            Self::Upstream { status } => *status == 429 || *status >= 500,
            Self::Timeout { .. } => true,
            Self::RetriesExhausted { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}

fn is_transient_io(err: &io::Error) -> bool {
    if matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::TimedOut
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    ) {
        return true;
    }
    // EBUSY / EMFILE are surfaced by kind only on recent toolchains
    matches!(err.raw_os_error(), Some(16) | Some(24))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_are_recoverable() {
        let err = ScanError::parse("app.js", "parser returned no tree");
        assert!(err.is_recoverable());
        assert!(!err.is_transient());
    }

    #[test]
    fn transience_classification() {
        assert!(ScanError::Io(io::Error::from(io::ErrorKind::ConnectionReset)).is_transient());
        assert!(ScanError::Io(io::Error::from(io::ErrorKind::TimedOut)).is_transient());
        assert!(!ScanError::Io(io::Error::from(io::ErrorKind::NotFound)).is_transient());
        assert!(ScanError::upstream(503).is_transient());
        assert!(ScanError::upstream(429).is_transient());
        assert!(!ScanError::upstream(404).is_transient());
        assert!(ScanError::timeout(Duration::from_millis(50)).is_transient());
        assert!(!ScanError::circuit_open("dataset").is_transient());
        assert!(!ScanError::policy_config(vec!["bad mode".into()]).is_transient());
    }

    #[test]
    fn policy_config_error_lists_every_violation() {
        let err = ScanError::policy_config(vec![
            "unknown enforcement mode 'strictest'".into(),
            "unknown severity 'fatal' for feature 'grid'".into(),
        ]);
        let text = err.to_string();
        assert!(text.contains("2 violation(s)"));
        assert!(text.contains("strictest"));
        assert!(text.contains("fatal"));
    }
}
