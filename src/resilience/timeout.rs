use std::io;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};
use tracing::warn;

use crate::error::{Result, ScanError};

/// Race `op` against a deadline.
///
/// The operation runs on a worker thread; if the deadline elapses first
/// the call fails with [`ScanError::Timeout`] and the eventual outcome of
/// the operation is discarded (the worker's send lands in a dropped
/// channel).
pub fn with_deadline<T, F>(deadline: Duration, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = bounded(1);
    std::thread::Builder::new()
        .name("basescan-deadline".to_string())
        .spawn(move || {
            let _ = tx.send(op());
        })?;

    match rx.recv_timeout(deadline) {
        Ok(outcome) => outcome,
        Err(RecvTimeoutError::Timeout) => {
            warn!(deadline_ms = deadline.as_millis() as u64, "operation missed its deadline");
            Err(ScanError::timeout(deadline))
        }
        Err(RecvTimeoutError::Disconnected) => Err(ScanError::Io(io::Error::other(
            "deadline worker terminated without a result",
        ))),
    }
}
