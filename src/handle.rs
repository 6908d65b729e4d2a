//! Read-only file handles.
//!
//! Every planner, reader and probe opens its own handle through [`open_shared`];
//! handles are never passed between concurrent operations. A plain read-only open
//! does not take a lock, so any number of handles on the same path can coexist.

use crate::config::RetryPolicy;
use std::fs::File;
use std::io::{self, ErrorKind};
use std::path::Path;
use std::thread;
use tracing::warn;

/// Error kinds that may clear up on their own.
fn is_transient(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::WouldBlock | ErrorKind::Interrupted | ErrorKind::ResourceBusy
    )
}

/// Open `path` read-only, retrying transient failures according to `retry`.
///
/// # Errors
/// Returns the last I/O error once attempts are exhausted, or the first non-transient one.
pub fn open_shared(path: &Path, retry: &RetryPolicy) -> io::Result<File> {
    open_with_retry(path, retry, || File::open(path))
}

/// Run `open` until it succeeds, fails with a non-transient error, or `retry` runs out
/// of attempts. `path` is only used for logging.
///
/// # Errors
/// The error from the final attempt.
pub fn open_with_retry<T, F>(path: &Path, retry: &RetryPolicy, mut open: F) -> io::Result<T>
where
    F: FnMut() -> io::Result<T>,
{
    let attempts = retry.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match open() {
            Ok(f) => return Ok(f),
            Err(e) if attempt < attempts && is_transient(e.kind()) => {
                warn!(
                    path = %path.display(),
                    attempt,
                    error = %e,
                    "transient open failure, retrying"
                );
                thread::sleep(retry.backoff());
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Length of the file behind `path`, taken from a fresh handle's metadata.
///
/// # Errors
/// Returns any I/O error from opening the file or reading its metadata.
pub fn file_len(path: &Path, retry: &RetryPolicy) -> io::Result<u64> {
    Ok(open_shared(path, retry)?.metadata()?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn retries(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff_ms: 0,
        }
    }

    /// An opener that fails with `kinds` in order, then succeeds.
    fn flaky(
        kinds: Vec<ErrorKind>,
    ) -> (impl FnMut() -> io::Result<&'static str>, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let open = move || {
            let n = seen.get();
            seen.set(n + 1);
            match kinds.get(n) {
                Some(&kind) => Err(io::Error::new(kind, format!("attempt {}", n + 1))),
                None => Ok("handle"),
            }
        };
        (open, calls)
    }

    #[test]
    fn transient_failures_are_retried() {
        let (open, calls) = flaky(vec![ErrorKind::WouldBlock, ErrorKind::WouldBlock]);
        let got = open_with_retry(Path::new("busy.csv"), &retries(3), open);
        assert_eq!(got.ok(), Some("handle"));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn interrupted_and_busy_are_transient() {
        let (open, calls) = flaky(vec![ErrorKind::Interrupted, ErrorKind::ResourceBusy]);
        assert!(open_with_retry(Path::new("busy.csv"), &retries(5), open).is_ok());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn non_transient_error_returns_immediately() {
        let (open, calls) = flaky(vec![ErrorKind::NotFound]);
        let err = open_with_retry(Path::new("gone.csv"), &retries(5), open).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn exhausted_attempts_return_last_error() {
        let (open, calls) = flaky(vec![ErrorKind::WouldBlock; 4]);
        let err = open_with_retry(Path::new("busy.csv"), &retries(3), open).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WouldBlock);
        assert_eq!(err.to_string(), "attempt 3");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn default_policy_makes_one_attempt() {
        let (open, calls) = flaky(vec![ErrorKind::WouldBlock]);
        assert!(open_with_retry(Path::new("busy.csv"), &RetryPolicy::default(), open).is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn open_shared_reads_a_real_file() -> io::Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        std::fs::write(file.path(), b"a\r\n")?;
        assert_eq!(file_len(file.path(), &retries(2))?, 3);
        Ok(())
    }
}
