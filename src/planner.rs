//! Partition planner.
//!
//! The planner turns a file length and a requested concurrency into a list of
//! contiguous byte ranges whose internal boundaries all sit right after a line
//! terminator. No range starts or ends mid-line.
//!
//! Each split target is measured from the previously confirmed boundary rather than
//! from a fixed grid:
//!
//! ```text
//! approx_k   = boundary_{k-1} + file_len / N
//! boundary_k = first offset >= approx_k that immediately follows a terminator
//! ```
//!
//! so the forward snap of one boundary shifts the next target instead of piling up.
//! The scan for a boundary reads fixed-size chunks from an owned handle and carries
//! the terminator state across chunk edges (see [`TerminatorScanner`]).
//!
//! When the file runs out of terminators before every boundary is placed, the
//! configured [`ShortfallPolicy`] decides between failing and returning a shorter plan.
//!
//! [`plan_with_cancel`] checks a [`CancelToken`] before every chunk of the scan, so a
//! cancelled or expired read stops planning within one buffer of work.

use crate::cancel::CancelToken;
use crate::config::{LineTerminator, ReadConfig, ShortfallPolicy};
use crate::error::{PlanningError, ReadError};
use crate::handle::open_shared;
use crate::partition::Partition;
use crate::terminator::TerminatorScanner;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, warn};

/// Plan `concurrency` partitions over the file at `path`, whose length is `file_len`.
///
/// The planner opens its own read-only handle.
///
/// # Errors
/// - [`PlanningError::ZeroConcurrency`] if `concurrency == 0`
/// - [`PlanningError::TooManyPartitions`] if `concurrency` exceeds the byte count
/// - [`PlanningError::TerminatorShortfall`] if terminators run out under [`ShortfallPolicy::Fail`]
/// - [`PlanningError::Io`] on open, seek or read failure
pub fn plan(
    path: impl AsRef<Path>,
    file_len: u64,
    concurrency: usize,
    config: &ReadConfig,
) -> Result<Vec<Partition>, PlanningError> {
    plan_with_cancel(path, file_len, concurrency, config, &CancelToken::new())
}

/// [`plan`], stopping early when `cancel` is cancelled or expires.
///
/// # Errors
/// As [`plan`], plus [`PlanningError::Cancelled`] / [`PlanningError::TimedOut`].
pub fn plan_with_cancel(
    path: impl AsRef<Path>,
    file_len: u64,
    concurrency: usize,
    config: &ReadConfig,
    cancel: &CancelToken,
) -> Result<Vec<Partition>, PlanningError> {
    // Cheap argument checks first; no handle is needed to reject them.
    check_concurrency(file_len, concurrency)?;
    if concurrency == 1 {
        return Ok(vec![Partition::new(0, 0, None)]);
    }
    check_interrupted(cancel)?;
    let mut file = open_shared(path.as_ref(), &config.retry)?;
    plan_from(&mut file, file_len, concurrency, config, cancel)
}

/// Plan over any seekable byte source. `file_len` is taken as given.
///
/// # Errors
/// Same as [`plan`], minus the open failure.
pub fn plan_reader<R: Read + Seek>(
    src: &mut R,
    file_len: u64,
    concurrency: usize,
    config: &ReadConfig,
) -> Result<Vec<Partition>, PlanningError> {
    plan_from(src, file_len, concurrency, config, &CancelToken::new())
}

fn plan_from<R: Read + Seek>(
    src: &mut R,
    file_len: u64,
    concurrency: usize,
    config: &ReadConfig,
    cancel: &CancelToken,
) -> Result<Vec<Partition>, PlanningError> {
    let interval = check_concurrency(file_len, concurrency)?;
    if concurrency == 1 {
        return Ok(vec![Partition::new(0, 0, None)]);
    }

    let term_len = config.terminator.len() as u64;
    let mut buf = vec![0u8; config.buffer_size.max(1)];
    let mut boundaries: Vec<u64> = Vec::with_capacity(concurrency - 1);
    let mut previous = 0u64;

    for candidate in 1..concurrency {
        let approx = previous + interval;
        // A terminator ending exactly at `approx` still counts.
        let scan_from = approx.saturating_sub(term_len).max(previous);
        match find_boundary(src, scan_from, config.terminator, &mut buf, cancel)? {
            Some(boundary) => {
                if boundary <= previous {
                    return Err(PlanningError::NotIncreasing { previous, boundary });
                }
                boundaries.push(boundary);
                previous = boundary;
            }
            None => match config.shortfall {
                ShortfallPolicy::Fail => {
                    return Err(PlanningError::TerminatorShortfall {
                        requested: concurrency,
                        found: boundaries.len(),
                    });
                }
                ShortfallPolicy::Degrade => {
                    warn!(
                        requested = concurrency,
                        planned = candidate,
                        "no terminator before end of file, returning a shorter plan"
                    );
                    break;
                }
            },
        }
    }

    let parts = partitions_from_boundaries(&boundaries);
    debug!(
        file_len,
        requested = concurrency,
        planned = parts.len(),
        ?boundaries,
        "partition plan ready"
    );
    Ok(parts)
}

/// Build the partition list from strictly increasing internal boundaries.
#[must_use]
pub fn partitions_from_boundaries(boundaries: &[u64]) -> Vec<Partition> {
    let mut parts = Vec::with_capacity(boundaries.len() + 1);
    let mut start = 0u64;
    for (i, &b) in boundaries.iter().enumerate() {
        parts.push(Partition::new(i, start, Some(b)));
        start = b;
    }
    parts.push(Partition::new(boundaries.len(), start, None));
    parts
}

/// Returns the even split interval.
fn check_concurrency(file_len: u64, concurrency: usize) -> Result<u64, PlanningError> {
    if concurrency == 0 {
        return Err(PlanningError::ZeroConcurrency);
    }
    let interval = file_len / concurrency as u64;
    if concurrency > 1 && interval == 0 {
        return Err(PlanningError::TooManyPartitions {
            requested: concurrency,
            file_len,
        });
    }
    Ok(interval)
}

fn check_interrupted(cancel: &CancelToken) -> Result<(), PlanningError> {
    match cancel.interruption() {
        Some(ReadError::TimedOut) => Err(PlanningError::TimedOut),
        Some(_) => Err(PlanningError::Cancelled),
        None => Ok(()),
    }
}

/// Scan forward from `from` for the next terminator and return the offset just past it,
/// or `None` if the source ends first.
fn find_boundary<R: Read + Seek>(
    src: &mut R,
    from: u64,
    terminator: LineTerminator,
    buf: &mut [u8],
    cancel: &CancelToken,
) -> Result<Option<u64>, PlanningError> {
    src.seek(SeekFrom::Start(from))?;
    let mut scanner = TerminatorScanner::new(terminator);
    let mut consumed = 0u64;
    loop {
        check_interrupted(cancel)?;
        let n = match src.read(buf) {
            Ok(0) => return Ok(None),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if let Some(i) = scanner.feed(&buf[..n]) {
            return Ok(Some(from + consumed + i as u64 + 1));
        }
        consumed += n as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    /// Cancels `token` once `limit` reads have been served.
    struct CancelAfter<'a> {
        inner: Cursor<Vec<u8>>,
        reads: usize,
        limit: usize,
        token: &'a CancelToken,
    }

    impl Read for CancelAfter<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            if self.reads >= self.limit {
                self.token.cancel();
            }
            self.inner.read(buf)
        }
    }

    impl Seek for CancelAfter<'_> {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    #[test]
    fn cancellation_stops_a_long_scan() {
        let mut bytes = b"a\r\n".to_vec();
        bytes.resize(64 * 1024, b'x');
        let len = bytes.len() as u64;
        let token = CancelToken::new();
        let mut src = CancelAfter {
            inner: Cursor::new(bytes),
            reads: 0,
            limit: 3,
            token: &token,
        };
        let cfg = ReadConfig::default()
            .with_buffer_size(16)
            .with_shortfall(ShortfallPolicy::Degrade);

        let err = plan_from(&mut src, len, 2, &cfg, &token).unwrap_err();
        assert!(matches!(err, PlanningError::Cancelled));
        assert_eq!(src.reads, 3);
    }

    #[test]
    fn expired_deadline_is_a_timeout() {
        let token = CancelToken::new().scoped(Some(std::time::Duration::ZERO));
        let mut src = Cursor::new(b"a\r\nb\r\nc\r\n".to_vec());
        let err = plan_from(&mut src, 9, 3, &ReadConfig::default(), &token).unwrap_err();
        assert!(matches!(err, PlanningError::TimedOut));
    }
}
