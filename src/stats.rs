//! Diagnostics collected during a concurrent read.

use crate::partition::Partition;
use serde::Serialize;
use std::time::Duration;

/// Per-partition figures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PartitionStats {
    pub index: usize,
    pub start: u64,
    pub end: Option<u64>,
    /// Bytes read for this partition.
    pub bytes: u64,
    /// Lines produced by this partition.
    pub lines: usize,
    /// Wall time spent reading and decoding this partition.
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

impl PartitionStats {
    #[must_use]
    pub fn new(partition: &Partition, bytes: u64, lines: usize, elapsed: Duration) -> Self {
        Self {
            index: partition.index,
            start: partition.start,
            end: partition.end,
            bytes,
            lines,
            elapsed,
        }
    }
}

/// Aggregate figures for one read.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReadStats {
    pub file_len: u64,
    /// Number of lines in the reassembled output.
    pub total_lines: usize,
    /// Lines that are empty or whitespace only.
    pub blank_lines: usize,
    pub bytes_read: u64,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
    pub partitions: Vec<PartitionStats>,
}

impl ReadStats {
    /// Build the aggregate figures from the reassembled lines and per-partition stats.
    #[must_use]
    pub fn collect(
        file_len: u64,
        lines: &[String],
        partitions: Vec<PartitionStats>,
        elapsed: Duration,
    ) -> Self {
        Self {
            file_len,
            total_lines: lines.len(),
            blank_lines: count_blank(lines),
            bytes_read: partitions.iter().map(|p| p.bytes).sum(),
            elapsed,
            partitions,
        }
    }

    /// Render the stats as pretty-printed JSON.
    ///
    /// # Errors
    /// Propagates `serde_json` serialization errors.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Count lines that are empty or consist only of whitespace.
#[must_use]
pub fn count_blank<S: AsRef<str>>(lines: &[S]) -> usize {
    lines.iter().filter(|l| l.as_ref().trim().is_empty()).count()
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}
