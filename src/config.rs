//! Configuration for partitioned reads.
//!
//! [`ReadConfig`] gathers every recognized option with its default. It can be built
//! in code with the `with_*` methods or loaded from a JSON file:
//!
//! ```no_run
//! use shardline::config::{LineTerminator, ReadConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = ReadConfig::default()
//!     .with_concurrency(8)
//!     .with_buffer_size(64 * 1024)
//!     .with_terminator(LineTerminator::Lf);
//!
//! let from_disk = ReadConfig::from_json_file("shardline.json")?;
//! # Ok(())
//! # }
//! ```
//!
//! Missing keys in a JSON file fall back to the defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default bytes per read chunk.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Line terminator convention of the input file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTerminator {
    /// `\r\n`
    #[default]
    Crlf,
    /// `\n`
    Lf,
}

impl LineTerminator {
    /// The terminator as raw bytes.
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Crlf => b"\r\n",
            Self::Lf => b"\n",
        }
    }

    /// The terminator as a string slice, used as the split delimiter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crlf => "\r\n",
            Self::Lf => "\n",
        }
    }

    /// Length of the terminator in bytes.
    #[must_use]
    pub const fn len(self) -> usize {
        self.as_bytes().len()
    }
}

/// Text encoding applied when decoding a partition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    /// Strict UTF-8; invalid bytes fail the read.
    #[default]
    Utf8,
    /// UTF-8 with invalid sequences replaced by U+FFFD.
    Utf8Lossy,
}

/// What the planner does when it runs out of line terminators before placing every boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallPolicy {
    /// Fail with
    /// [`PlanningError::TerminatorShortfall`](crate::error::PlanningError::TerminatorShortfall).
    #[default]
    Fail,
    /// Stop planning and let the remaining bytes form the final partition.
    Degrade,
}

/// Retry policy for opening a file handle under transient contention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first. `1` disables retries.
    pub max_attempts: u32,
    /// Delay between attempts, in milliseconds.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 0,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Options recognized by the planner, the range readers and the coordinator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadConfig {
    /// Number of partitions, and so of concurrent range reads.
    pub concurrency: usize,
    /// Bytes per read chunk.
    pub buffer_size: usize,
    /// Line terminator convention.
    pub terminator: LineTerminator,
    /// Text encoding.
    pub encoding: TextEncoding,
    /// Planner behaviour when terminators run out.
    pub shortfall: ShortfallPolicy,
    /// Worker threads for the parallel fan-out. `None` uses one thread per partition.
    pub threads: Option<usize>,
    /// Deadline for the whole read, in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Retry policy for opening file handles.
    pub retry: RetryPolicy,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            concurrency: num_cpus::get().max(1),
            buffer_size: DEFAULT_BUFFER_SIZE,
            terminator: LineTerminator::default(),
            encoding: TextEncoding::default(),
            shortfall: ShortfallPolicy::default(),
            threads: None,
            timeout_ms: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl ReadConfig {
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    #[must_use]
    pub fn with_terminator(mut self, terminator: LineTerminator) -> Self {
        self.terminator = terminator;
        self
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    #[must_use]
    pub fn with_shortfall(mut self, shortfall: ShortfallPolicy) -> Self {
        self.shortfall = shortfall;
        self
    }

    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The configured deadline as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Load a config from a JSON file. Missing keys take their defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or fails
    /// [`validate`](Self::validate).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values no read can run with.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be positive".into()));
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must be positive".into()));
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid("threads must be positive".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
