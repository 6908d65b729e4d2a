//! Assertion functions for read outputs and partition plans.

use crate::config::ReadConfig;
use crate::error::ReadError;
use crate::partition::{Partition, check_contiguous};
use crate::reader::read_sequential;
use std::fmt::Debug;
use std::path::Path;

/// Assert that two line sequences are equal in order and content.
///
/// # Panics
///
/// Panics if the sequences differ in length or at any index.
///
/// # Example
///
/// ```
/// use shardline::testing::assert_lines_equal;
///
/// assert_lines_equal(&["a", "b"], &["a", "b"]);
/// ```
pub fn assert_lines_equal<T: Debug + PartialEq>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Line count mismatch:\n  Expected: {}\n  Actual: {}",
        expected.len(),
        actual.len()
    );

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert_eq!(
            a, e,
            "Line mismatch at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}"
        );
    }
}

/// Assert that `lines` equals a single sequential read of the file at `path`.
///
/// # Errors
/// Returns the sequential read's error, if any.
///
/// # Panics
///
/// Panics if the sequences differ.
pub fn assert_matches_sequential(
    path: impl AsRef<Path>,
    lines: &[String],
    config: &ReadConfig,
) -> Result<(), ReadError> {
    let expected = read_sequential(path, config)?;
    assert_lines_equal(lines, &expected);
    Ok(())
}

/// Assert that a plan starts at 0, is contiguous with strictly increasing boundaries,
/// and ends open-ended.
///
/// # Panics
///
/// Panics with the first violated invariant.
pub fn assert_plan_contiguous(parts: &[Partition]) {
    if let Err(msg) = check_contiguous(parts) {
        panic!("Invalid partition plan: {msg}\n  Plan: {parts:?}");
    }
}
