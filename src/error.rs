//! Error taxonomy for planning, range reads and the aggregate read.
//!
//! Each layer has its own error type:
//! - [`PlanningError`] - the partition plan could not be built; no reads were started
//! - [`ReadError`] - a single range read or probe failed
//! - [`AggregateError`] - the whole concurrent read failed; wraps the first failure by index
//! - [`ConfigError`] - a [`ReadConfig`](crate::config::ReadConfig) was rejected

use std::io;
use std::path::PathBuf;
use std::str::Utf8Error;

/// Failure while computing the partition plan.
#[derive(thiserror::Error, Debug)]
pub enum PlanningError {
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("cannot split {file_len} bytes into {requested} partitions")]
    TooManyPartitions { requested: usize, file_len: u64 },

    #[error("boundary {boundary} does not follow previous boundary {previous}")]
    NotIncreasing { previous: u64, boundary: u64 },

    #[error("requested {requested} partitions but only {found} line boundaries could be placed")]
    TerminatorShortfall { requested: usize, found: usize },

    #[error("I/O failure while planning: {0}")]
    Io(#[from] io::Error),

    #[error("planning cancelled")]
    Cancelled,

    #[error("planning deadline exceeded")]
    TimedOut,
}

/// Failure while reading, decoding or probing a byte range.
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    #[error("start offset {start} is beyond the end of the file ({file_len} bytes)")]
    SeekBeyondEnd { start: u64, file_len: u64 },

    #[error("range end {end} precedes range start {start}")]
    InvalidRange { start: u64, end: u64 },

    #[error("invalid text at byte offset {offset}: {source}")]
    Decode {
        offset: u64,
        #[source]
        source: Utf8Error,
    },

    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),

    #[error("read cancelled")]
    Cancelled,

    #[error("read deadline exceeded")]
    TimedOut,
}

impl ReadError {
    /// `true` for the interruptions raised by the coordinator rather than by the read itself.
    pub fn is_interruption(&self) -> bool {
        matches!(self, Self::Cancelled | Self::TimedOut)
    }
}

/// Failure of a whole concurrent read.
#[derive(thiserror::Error, Debug)]
pub enum AggregateError {
    #[error("planning failed: {0}")]
    Planning(PlanningError),

    #[error("partition {index} failed: {cause}")]
    Partition {
        index: usize,
        #[source]
        cause: ReadError,
    },

    #[error("read cancelled")]
    Cancelled,

    #[error("read deadline exceeded")]
    TimedOut,

    #[error("cannot start reader pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl From<PlanningError> for AggregateError {
    /// An interrupted plan is reported the same way as an interrupted read.
    fn from(e: PlanningError) -> Self {
        match e {
            PlanningError::Cancelled => Self::Cancelled,
            PlanningError::TimedOut => Self::TimedOut,
            other => Self::Planning(other),
        }
    }
}

/// Rejected or unreadable configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
