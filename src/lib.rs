//! # Shardline
//!
//! Parallel, boundary-safe reading of large line-delimited text files.
//!
//! Shardline splits a file into N byte ranges of roughly equal size and moves every
//! split point forward to just past the next line terminator. It then reads all ranges
//! concurrently, each on its own handle, and stitches the lines back together in file
//! order. The result is identical to decoding and splitting the file in one
//! sequential pass; only the wall-clock time changes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use shardline::read_file_concurrently;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let outcome = read_file_concurrently("citizens.csv", 10, 4096)?;
//! println!("Results: {}", outcome.stats.total_lines);
//! println!("Empty Rows: {}", outcome.stats.blank_lines);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Partition plan
//!
//! [`planner::plan`] produces a list of [`Partition`]s. Each one covers
//! `[start, end)`; the last one has `end == None` and runs to end of file. Adjacent
//! partitions share a boundary that sits immediately after a line terminator.
//!
//! ### Range reads
//!
//! [`reader::read_range`] materializes one partition, decodes it and splits it into
//! lines. A non-final partition drops its closing terminator before splitting, so
//! concatenating partitions never introduces a spurious empty line.
//!
//! ### Coordination
//!
//! [`Coordinator`] plans once, fans out one range read per partition on a rayon pool,
//! joins them, and concatenates the results by partition index. The first failing
//! partition by index is reported as [`AggregateError::Partition`]; higher partitions
//! are cancelled. External cancellation and deadlines go through [`CancelToken`].
//!
//! ### Boundary probe
//!
//! [`probe::probe`] classifies a single offset as a [`TriState`]. It is not used by
//! the pipeline and exists for offline plan verification ([`probe::validate_plan`]).
//!
//! ## Configuration
//!
//! [`ReadConfig`] covers concurrency, chunk size, terminator (`CRLF` by default),
//! encoding (strict UTF-8 by default), shortfall policy, worker threads, timeout and
//! open retries. It can be loaded from JSON with [`ReadConfig::from_json_file`].
//!
//! ## Module Overview
//!
//! - [`config`] - recognized options and their defaults
//! - [`planner`] - terminator-aligned partition planning
//! - [`reader`] - range reads, decoding and the sequential reference read
//! - [`coordinator`] - concurrent fan-out and ordered reassembly
//! - [`probe`] - ternary boundary validation
//! - [`stats`] - line counts and timing diagnostics
//! - [`testing`] - fixtures and assertions for tests

pub mod cancel;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod handle;
pub mod partition;
pub mod planner;
pub mod probe;
pub mod reader;
pub mod stats;
pub mod terminator;
pub mod testing;

pub use cancel::CancelToken;
pub use config::{LineTerminator, ReadConfig, RetryPolicy, ShortfallPolicy, TextEncoding};
pub use coordinator::{Coordinator, ExecMode, ReadOutcome, read_file_concurrently};
pub use error::{AggregateError, ConfigError, PlanningError, ReadError};
pub use partition::Partition;
pub use probe::TriState;
pub use reader::{read_range, read_sequential};
pub use stats::{PartitionStats, ReadStats};
