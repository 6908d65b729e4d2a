//! Testing utilities for partitioned reads.
//!
//! - **Fixtures**: temporary line-delimited files with a chosen terminator
//! - **Assertions**: ordered line comparison and plan invariant checks
//!
//! # Quick Start
//!
//! ```no_run
//! use shardline::testing::*;
//! use shardline::{read_file_concurrently, LineTerminator};
//!
//! #[test]
//! fn reads_in_order() -> anyhow::Result<()> {
//!     let file = LineFile::new(&numbered_lines(100), LineTerminator::Crlf)?;
//!     let outcome = read_file_concurrently(file.path(), 4, 16)?;
//!     assert_matches_sequential(file.path(), &outcome.lines, file.config())?;
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
