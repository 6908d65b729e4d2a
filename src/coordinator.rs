//! Coordinator: plan once, read every partition concurrently, reassemble in order.
//!
//! ```no_run
//! use shardline::{Coordinator, ReadConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let coordinator = Coordinator::new(ReadConfig::default().with_concurrency(10));
//! let outcome = coordinator.read("citizens.csv")?;
//! println!("Results: {}", outcome.stats.total_lines);
//! println!("Empty Rows: {}", outcome.stats.blank_lines);
//! # Ok(())
//! # }
//! ```
//!
//! Reads run on a dedicated rayon pool sized to the partition count by default, so
//! every range can be in flight at once. Results are gathered into a vector indexed
//! by partition; completion order never affects the output.
//!
//! Failure is fail-fast and deterministic: the reported error is always the failing
//! partition with the lowest index, and partitions above it are cancelled.

use crate::cancel::CancelToken;
use crate::config::ReadConfig;
use crate::error::{AggregateError, PlanningError, ReadError};
use crate::handle::file_len;
use crate::partition::Partition;
use crate::planner;
use crate::reader::{decode_lines, read_range_bytes};
use crate::stats::{PartitionStats, ReadStats};
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// How the partition reads are scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    /// One partition after another on the calling thread.
    Sequential,
    /// All partitions on a rayon pool. `threads: None` uses one thread per partition.
    Parallel { threads: Option<usize> },
}

/// Result of a successful concurrent read.
#[derive(Clone, Debug)]
pub struct ReadOutcome {
    /// Every line of the file, in file order.
    pub lines: Vec<String>,
    /// The plan the read ran with.
    pub partitions: Vec<Partition>,
    pub stats: ReadStats,
}

/// Drives a partitioned read of one file.
#[derive(Clone, Debug)]
pub struct Coordinator {
    pub mode: ExecMode,
    pub config: ReadConfig,
    cancel: CancelToken,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(ReadConfig::default())
    }
}

impl Coordinator {
    #[must_use]
    pub fn new(config: ReadConfig) -> Self {
        Self {
            mode: ExecMode::Parallel {
                threads: config.threads,
            },
            config,
            cancel: CancelToken::new(),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ExecMode) -> Self {
        self.mode = mode;
        self
    }

    /// Observe an external cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// A handle that cancels reads started by this coordinator.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Compute the partition plan for `path` without reading it.
    ///
    /// # Errors
    /// [`AggregateError::Planning`] if the length query or the planner fails;
    /// [`AggregateError::Cancelled`] / [`AggregateError::TimedOut`] if planning is interrupted.
    pub fn plan(&self, path: impl AsRef<Path>) -> Result<Vec<Partition>, AggregateError> {
        let path = path.as_ref();
        let token = self.cancel.scoped(self.config.timeout());
        let len = file_len(path, &self.config.retry).map_err(PlanningError::from)?;
        Ok(planner::plan_with_cancel(
            path,
            len,
            self.config.concurrency,
            &self.config,
            &token,
        )?)
    }

    /// Read the whole file at `path` through the partitioned pipeline.
    ///
    /// # Errors
    /// - [`AggregateError::Planning`] if no valid plan exists; no reads are started
    /// - [`AggregateError::Partition`] with the lowest failing partition index
    /// - [`AggregateError::Cancelled`] / [`AggregateError::TimedOut`] on interruption, which
    ///   also stops a planning scan that is still running
    /// - [`AggregateError::Pool`] if the reader threads cannot be started
    pub fn read(&self, path: impl AsRef<Path>) -> Result<ReadOutcome, AggregateError> {
        let path = path.as_ref();
        let started = Instant::now();
        let token = self.cancel.scoped(self.config.timeout());

        let len = file_len(path, &self.config.retry).map_err(PlanningError::from)?;
        let parts =
            planner::plan_with_cancel(path, len, self.config.concurrency, &self.config, &token)?;
        if let Some(e) = token.interruption() {
            return Err(interrupted(&e));
        }

        let results: Vec<Result<(Vec<String>, PartitionStats), ReadError>> = match self.mode {
            ExecMode::Sequential => parts
                .iter()
                .map(|p| self.read_one(path, p, &token))
                .collect(),
            ExecMode::Parallel { threads } => {
                let threads = threads.unwrap_or(parts.len()).max(1);
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("shardline-reader-{i}"))
                    .build()?;
                pool.install(|| {
                    parts
                        .par_iter()
                        .map(|p| self.read_one(path, p, &token))
                        .collect()
                })
            }
        };

        let mut outputs = Vec::with_capacity(results.len());
        let mut interruption: Option<ReadError> = None;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(out) => outputs.push(out),
                Err(e) if e.is_interruption() => {
                    interruption.get_or_insert(e);
                }
                Err(cause) => return Err(AggregateError::Partition { index, cause }),
            }
        }
        if let Some(e) = interruption {
            return Err(interrupted(&e));
        }

        let total: usize = outputs.iter().map(|(l, _)| l.len()).sum();
        let mut lines = Vec::with_capacity(total);
        let mut per_partition = Vec::with_capacity(outputs.len());
        for (chunk, stats) in outputs {
            lines.extend(chunk);
            per_partition.push(stats);
        }
        let stats = ReadStats::collect(len, &lines, per_partition, started.elapsed());
        debug!(
            path = %path.display(),
            partitions = parts.len(),
            lines = stats.total_lines,
            blank = stats.blank_lines,
            elapsed = ?stats.elapsed,
            "concurrent read complete"
        );
        Ok(ReadOutcome {
            lines,
            partitions: parts,
            stats,
        })
    }

    fn read_one(
        &self,
        path: &Path,
        partition: &Partition,
        token: &CancelToken,
    ) -> Result<(Vec<String>, PartitionStats), ReadError> {
        let t0 = Instant::now();
        let result = read_range_bytes(path, partition, &self.config, token).and_then(|bytes| {
            let lines = decode_lines(&bytes, partition, &self.config)?;
            Ok((bytes.len() as u64, lines))
        });
        match result {
            Ok((bytes, lines)) => {
                debug!(%partition, bytes, lines = lines.len(), "partition read");
                let stats = PartitionStats::new(partition, bytes, lines.len(), t0.elapsed());
                Ok((lines, stats))
            }
            Err(e) => {
                if !e.is_interruption() {
                    token.record_failure(partition.index);
                }
                debug!(%partition, error = %e, "partition failed");
                Err(e)
            }
        }
    }
}

fn interrupted(e: &ReadError) -> AggregateError {
    match e {
        ReadError::TimedOut => AggregateError::TimedOut,
        _ => AggregateError::Cancelled,
    }
}

/// Read `path` with `concurrency` partitions and `buffer_size`-byte chunks, using
/// defaults for every other option.
///
/// # Errors
/// As [`Coordinator::read`].
pub fn read_file_concurrently(
    path: impl AsRef<Path>,
    concurrency: usize,
    buffer_size: usize,
) -> Result<ReadOutcome, AggregateError> {
    let config = ReadConfig::default()
        .with_concurrency(concurrency)
        .with_buffer_size(buffer_size);
    Coordinator::new(config).read(path)
}
