//! Range reader: materialize one partition and split it into lines.
//!
//! A range read owns everything it touches: a fresh read-only handle, a chunk buffer
//! and an output buffer sized to the partition. Nothing is shared with other reads, so
//! any number of them can run at once on the same file.
//!
//! Decoding and splitting follow the configured [`TextEncoding`] and
//! [`LineTerminator`](crate::config::LineTerminator). The per-partition output is
//! shaped so that concatenating all partitions in order gives exactly what
//! [`read_sequential`] gives for the whole file.

use crate::cancel::CancelToken;
use crate::config::{ReadConfig, TextEncoding};
use crate::error::ReadError;
use crate::handle::open_shared;
use crate::partition::Partition;
use crate::terminator::split_lines;
use std::borrow::Cow;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::trace;

/// UTF-8 byte-order mark.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read, decode and split one partition of the file at `path`.
///
/// # Errors
/// - [`ReadError::SeekBeyondEnd`] if the partition starts past end of file
/// - [`ReadError::InvalidRange`] if `end < start`
/// - [`ReadError::Decode`] if the bytes are invalid under [`TextEncoding::Utf8`]
/// - [`ReadError::Io`] on open/seek/read failure, or if the file is shorter than the range
/// - [`ReadError::Cancelled`] / [`ReadError::TimedOut`] when `cancel` trips mid-read
pub fn read_range(
    path: impl AsRef<Path>,
    partition: &Partition,
    config: &ReadConfig,
    cancel: &CancelToken,
) -> Result<Vec<String>, ReadError> {
    let bytes = read_range_bytes(path, partition, config, cancel)?;
    decode_lines(&bytes, partition, config)
}

/// Read the raw bytes of one partition, without decoding.
///
/// # Errors
/// As [`read_range`], minus [`ReadError::Decode`].
pub fn read_range_bytes(
    path: impl AsRef<Path>,
    partition: &Partition,
    config: &ReadConfig,
    cancel: &CancelToken,
) -> Result<Vec<u8>, ReadError> {
    cancel.check(partition.index)?;
    let mut file = open_shared(path.as_ref(), &config.retry)?;
    let file_len = file.metadata()?.len();
    read_range_from(&mut file, file_len, partition, config.buffer_size, cancel)
}

/// Copy the bytes of `partition` out of `src` in `buffer_size` chunks.
///
/// The output buffer is allocated once at the exact target size; the final chunk is
/// cut at the target count.
///
/// # Errors
/// As [`read_range_bytes`].
pub fn read_range_from<R: Read + Seek>(
    src: &mut R,
    file_len: u64,
    partition: &Partition,
    buffer_size: usize,
    cancel: &CancelToken,
) -> Result<Vec<u8>, ReadError> {
    let Partition { index, start, end } = *partition;
    if start > file_len {
        return Err(ReadError::SeekBeyondEnd { start, file_len });
    }
    let target = match end {
        Some(end) if end < start => return Err(ReadError::InvalidRange { start, end }),
        Some(end) => end - start,
        None => file_len - start,
    };
    let target = usize::try_from(target).map_err(|_| {
        io::Error::new(
            ErrorKind::InvalidInput,
            format!("partition {index} of {target} bytes does not fit in memory"),
        )
    })?;

    src.seek(SeekFrom::Start(start))?;
    let mut out = Vec::with_capacity(target);
    let mut chunk = vec![0u8; buffer_size.max(1)];
    while out.len() < target {
        cancel.check(index)?;
        let n = match src.read(&mut chunk) {
            Ok(0) => {
                return Err(ReadError::Io(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!(
                        "partition {index}: expected {target} bytes from offset {start}, got {}",
                        out.len()
                    ),
                )));
            }
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        let take = n.min(target - out.len());
        out.extend_from_slice(&chunk[..take]);
    }
    trace!(index, start, bytes = out.len(), "range read complete");
    Ok(out)
}

/// Decode the bytes of `partition` and split them into lines.
///
/// A leading byte-order mark is dropped only when the partition starts at offset 0.
///
/// # Errors
/// [`ReadError::Decode`] with the absolute file offset of the first invalid byte.
pub fn decode_lines(
    bytes: &[u8],
    partition: &Partition,
    config: &ReadConfig,
) -> Result<Vec<String>, ReadError> {
    let body = if partition.start == 0 {
        bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
    } else {
        bytes
    };
    let skipped = (bytes.len() - body.len()) as u64;
    let text: Cow<'_, str> = match config.encoding {
        TextEncoding::Utf8 => Cow::Borrowed(std::str::from_utf8(body).map_err(|source| {
            ReadError::Decode {
                offset: partition.start + skipped + source.valid_up_to() as u64,
                source,
            }
        })?),
        TextEncoding::Utf8Lossy => String::from_utf8_lossy(body),
    };
    Ok(split_lines(&text, config.terminator, partition.is_final()))
}

/// Decode and split the whole file in one pass on a single handle.
///
/// This is the reference result a partitioned read must reproduce.
///
/// # Errors
/// [`ReadError::Io`] on I/O failure, [`ReadError::Decode`] on invalid text.
pub fn read_sequential(
    path: impl AsRef<Path>,
    config: &ReadConfig,
) -> Result<Vec<String>, ReadError> {
    let mut file = open_shared(path.as_ref(), &config.retry)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    decode_lines(&bytes, &Partition::new(0, 0, None), config)
}
