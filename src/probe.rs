//! Boundary probe: check whether an offset sits right after a line terminator.
//!
//! The probe is not used by the read pipeline. It is a standalone check for offline
//! verification of a plan: [`validate_plan`] probes every internal boundary of a
//! partition list.

use crate::config::{LineTerminator, ReadConfig, RetryPolicy};
use crate::error::ReadError;
use crate::handle::open_shared;
use crate::partition::Partition;
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

/// Confidence that an offset is a line boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TriState {
    /// A complete terminator ends immediately before the offset.
    True,
    /// The byte before the offset is a line feed, but it is the only byte available,
    /// so the full terminator cannot be confirmed.
    SortOf,
    /// Not a boundary, or nothing could be read.
    False,
}

impl TriState {
    #[must_use]
    pub fn is_confirmed(self) -> bool {
        self == Self::True
    }
}

impl Display for TriState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.write_str(match self {
            Self::True => "true",
            Self::SortOf => "sort of true",
            Self::False => "false",
        })
    }
}

/// Probe `offset` in the file at `path` on a fresh handle, opened under `retry`.
///
/// # Errors
/// [`ReadError::SeekBeyondEnd`] if `offset` is past end of file, [`ReadError::Io`] on I/O failure.
pub fn probe(
    path: impl AsRef<Path>,
    offset: u64,
    terminator: LineTerminator,
    retry: &RetryPolicy,
) -> Result<TriState, ReadError> {
    let mut file = open_shared(path.as_ref(), retry)?;
    let file_len = file.metadata()?.len();
    probe_reader(&mut file, file_len, offset, terminator)
}

/// Probe `offset` over any seekable source of length `file_len`.
///
/// Looks at the (up to) two bytes just before `offset`.
///
/// # Errors
/// As [`probe`].
pub fn probe_reader<R: Read + Seek>(
    src: &mut R,
    file_len: u64,
    offset: u64,
    terminator: LineTerminator,
) -> Result<TriState, ReadError> {
    if offset > file_len {
        return Err(ReadError::SeekBeyondEnd {
            start: offset,
            file_len,
        });
    }
    if offset == 0 {
        return Ok(TriState::False);
    }
    let from = offset.saturating_sub(2);
    src.seek(SeekFrom::Start(from))?;

    let mut window = [0u8; 2];
    let want = (offset - from) as usize;
    let mut got = 0;
    while got < want {
        match src.read(&mut window[got..want]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    let window = &window[..got];

    Ok(match (terminator, window) {
        (_, []) => TriState::False,
        (LineTerminator::Lf, [.., b'\n']) => TriState::True,
        (LineTerminator::Crlf, [b'\r', b'\n']) => TriState::True,
        (LineTerminator::Crlf, [b'\n']) => TriState::SortOf,
        _ => TriState::False,
    })
}

/// Probe result for one internal boundary of a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BoundaryCheck {
    /// Index of the partition the boundary closes.
    pub index: usize,
    /// The boundary offset (the partition's exclusive end).
    pub offset: u64,
    pub state: TriState,
}

/// Probe the end of every bounded partition in `parts`, using the terminator and
/// open retry policy of `config`.
///
/// # Errors
/// The first probe failure.
pub fn validate_plan(
    path: impl AsRef<Path>,
    parts: &[Partition],
    config: &ReadConfig,
) -> Result<Vec<BoundaryCheck>, ReadError> {
    let path = path.as_ref();
    parts
        .iter()
        .filter_map(|p| p.end.map(|end| (p.index, end)))
        .map(|(index, offset)| {
            probe(path, offset, config.terminator, &config.retry).map(|state| BoundaryCheck {
                index,
                offset,
                state,
            })
        })
        .collect()
}
