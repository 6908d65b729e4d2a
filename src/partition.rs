//! Byte-range partitions of a file.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FormatResult};

/// A contiguous byte range of the input file.
///
/// `start` is inclusive and `end` is exclusive. `end == None` means "read to end of file"
/// and only occurs on the last partition of a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    /// Position of this partition in the plan.
    pub index: usize,
    /// First byte of the range.
    pub start: u64,
    /// One past the last byte, or `None` for end of file.
    pub end: Option<u64>,
}

impl Partition {
    #[must_use]
    pub fn new(index: usize, start: u64, end: Option<u64>) -> Self {
        Self { index, start, end }
    }

    /// Whether this partition runs to end of file.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.end.is_none()
    }

    /// Offset of the last byte covered, when the range is bounded and non-empty.
    ///
    /// For adjacent partitions `a`, `b`: `a.last_byte() + 1 == b.start`.
    #[must_use]
    pub fn last_byte(&self) -> Option<u64> {
        self.end.and_then(|e| e.checked_sub(1)).filter(|&l| l >= self.start)
    }

    /// Number of bytes covered, given the file length.
    #[must_use]
    pub fn byte_len(&self, file_len: u64) -> u64 {
        self.end.unwrap_or(file_len).saturating_sub(self.start)
    }
}

impl Display for Partition {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self.end {
            Some(end) => write!(f, "#{} [{}, {})", self.index, self.start, end),
            None => write!(f, "#{} [{}, EOF)", self.index, self.start),
        }
    }
}

/// Check the structural invariants of a plan: it starts at 0, the ranges are contiguous
/// with strictly increasing boundaries, the indices are sequential, and only the last
/// partition is open-ended.
///
/// Returns a description of the first violation.
///
/// # Errors
/// Returns `Err(message)` when any invariant is broken.
pub fn check_contiguous(parts: &[Partition]) -> Result<(), String> {
    let Some(first) = parts.first() else {
        return Err("plan is empty".into());
    };
    if first.start != 0 {
        return Err(format!("first partition starts at {}", first.start));
    }
    for (i, pair) in parts.windows(2).enumerate() {
        let (a, b) = (&pair[0], &pair[1]);
        let Some(end) = a.end else {
            return Err(format!("partition {i} is open-ended but not last"));
        };
        if end <= a.start {
            return Err(format!("partition {i} is empty or inverted: {a}"));
        }
        if end != b.start {
            return Err(format!("gap or overlap between {a} and {b}"));
        }
    }
    for (i, p) in parts.iter().enumerate() {
        if p.index != i {
            return Err(format!("partition at position {i} has index {}", p.index));
        }
    }
    match parts.last() {
        Some(last) if last.end.is_none() => Ok(()),
        _ => Err("last partition is bounded".into()),
    }
}
