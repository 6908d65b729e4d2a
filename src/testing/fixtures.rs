//! Temporary input files for tests.

use crate::config::{LineTerminator, ReadConfig};
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// A temporary line-delimited file, deleted on drop.
pub struct LineFile {
    file: NamedTempFile,
    config: ReadConfig,
}

impl LineFile {
    /// Write `lines`, each followed by `terminator`.
    ///
    /// # Errors
    /// Returns an error if the temporary file cannot be created or written.
    pub fn new<S: AsRef<str>>(lines: &[S], terminator: LineTerminator) -> io::Result<Self> {
        let mut body = String::new();
        for line in lines {
            body.push_str(line.as_ref());
            body.push_str(terminator.as_str());
        }
        Self::from_bytes(body.as_bytes(), terminator)
    }

    /// Write `bytes` verbatim.
    ///
    /// # Errors
    /// Returns an error if the temporary file cannot be created or written.
    pub fn from_bytes(bytes: &[u8], terminator: LineTerminator) -> io::Result<Self> {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self {
            file,
            config: ReadConfig::default().with_terminator(terminator),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// A default config matching this file's terminator.
    #[must_use]
    pub fn config(&self) -> &ReadConfig {
        &self.config
    }

    /// Length of the file in bytes.
    ///
    /// # Errors
    /// Returns an error if the file metadata cannot be read.
    pub fn len(&self) -> io::Result<u64> {
        Ok(self.file.as_file().metadata()?.len())
    }

    /// Whether the file holds no bytes.
    ///
    /// # Errors
    /// Returns an error if the file metadata cannot be read.
    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// `"line-0000"`, `"line-0001"`, ... of equal width.
#[must_use]
pub fn numbered_lines(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("line-{i:04}")).collect()
}

/// CSV-shaped rows with varying widths and the occasional blank row.
///
/// Every seventh row is empty and every eleventh is whitespace only.
#[must_use]
pub fn sample_csv_rows(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| match i {
            i if i % 7 == 6 => String::new(),
            i if i % 11 == 10 => "   ".to_string(),
            i => format!("{i},citizen-{},{}", "x".repeat(i % 13), i * 37 % 101),
        })
        .collect()
}
