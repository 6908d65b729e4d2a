use anyhow::Result;
use shardline::reader::{decode_lines, read_range_bytes, read_range_from};
use shardline::testing::*;
use shardline::{
    CancelToken, LineTerminator, Partition, ReadConfig, ReadError, TextEncoding, read_range,
    read_sequential,
};
use std::io::{Cursor, ErrorKind};

const EXAMPLE: &[u8] = b"a\r\nb\r\nc\r\nd\r\n";

#[test]
fn worked_example_partitions() -> Result<()> {
    let file = LineFile::from_bytes(EXAMPLE, LineTerminator::Crlf)?;
    let cancel = CancelToken::new();
    let first = read_range(file.path(), &Partition::new(0, 0, Some(6)), file.config(), &cancel)?;
    let last = read_range(file.path(), &Partition::new(1, 6, None), file.config(), &cancel)?;
    assert_lines_equal(&first, &["a".to_string(), "b".to_string()]);
    assert_eq!(last, vec!["c", "d", ""]);
    Ok(())
}

#[test]
fn sequential_reference_keeps_trailing_empty_line() -> Result<()> {
    let file = LineFile::from_bytes(EXAMPLE, LineTerminator::Crlf)?;
    assert_eq!(
        read_sequential(file.path(), file.config())?,
        vec!["a", "b", "c", "d", ""]
    );
    Ok(())
}

#[test]
fn start_past_end_of_file() -> Result<()> {
    let file = LineFile::from_bytes(EXAMPLE, LineTerminator::Crlf)?;
    let err = read_range(
        file.path(),
        &Partition::new(0, 100, None),
        file.config(),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ReadError::SeekBeyondEnd {
            start: 100,
            file_len: 12
        }
    ));
    Ok(())
}

#[test]
fn inverted_range() -> Result<()> {
    let file = LineFile::from_bytes(EXAMPLE, LineTerminator::Crlf)?;
    let err = read_range(
        file.path(),
        &Partition::new(0, 6, Some(3)),
        file.config(),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ReadError::InvalidRange { start: 6, end: 3 }));
    Ok(())
}

#[test]
fn reading_past_end_of_file_is_detected() -> Result<()> {
    let file = LineFile::from_bytes(EXAMPLE, LineTerminator::Crlf)?;
    let err = read_range_bytes(
        file.path(),
        &Partition::new(0, 6, Some(100)),
        file.config(),
        &CancelToken::new(),
    )
    .unwrap_err();
    match err {
        ReadError::Io(e) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
        other => panic!("expected UnexpectedEof, got {other:?}"),
    }
    Ok(())
}

#[test]
fn open_ended_partition_reads_to_true_end() -> Result<()> {
    let file = LineFile::new(&numbered_lines(30), LineTerminator::Crlf)?;
    let bytes = read_range_bytes(
        file.path(),
        &Partition::new(0, 110, None),
        &file.config().clone().with_buffer_size(7),
        &CancelToken::new(),
    )?;
    assert_eq!(bytes.len() as u64, file.len()? - 110);
    assert!(bytes.starts_with(b"line-0010\r\n"));
    assert!(bytes.ends_with(b"line-0029\r\n"));
    Ok(())
}

#[test]
fn final_chunk_is_cut_at_target() -> Result<()> {
    let mut src = Cursor::new(b"abcdefghij");
    let bytes = read_range_from(
        &mut src,
        10,
        &Partition::new(0, 2, Some(7)),
        4,
        &CancelToken::new(),
    )?;
    assert_eq!(bytes, b"cdefg");
    Ok(())
}

#[test]
fn chunk_size_does_not_change_bytes() -> Result<()> {
    let file = LineFile::new(&sample_csv_rows(200), LineTerminator::Crlf)?;
    let part = Partition::new(0, 0, None);
    let reference = read_range_bytes(file.path(), &part, file.config(), &CancelToken::new())?;
    for buffer_size in [1, 2, 13, 4096, 1 << 16] {
        let cfg = file.config().clone().with_buffer_size(buffer_size);
        let bytes = read_range_bytes(file.path(), &part, &cfg, &CancelToken::new())?;
        assert_eq!(bytes, reference, "buffer_size = {buffer_size}");
    }
    Ok(())
}

#[test]
fn invalid_utf8_reports_file_offset() -> Result<()> {
    let file = LineFile::from_bytes(b"ok\r\n\xff\xfe\r\n", LineTerminator::Crlf)?;
    let err = read_range(
        file.path(),
        &Partition::new(0, 0, None),
        file.config(),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ReadError::Decode { offset: 4, .. }));

    let err = read_range(
        file.path(),
        &Partition::new(1, 4, None),
        file.config(),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ReadError::Decode { offset: 4, .. }));
    Ok(())
}

#[test]
fn lossy_decoding_replaces_invalid_bytes() -> Result<()> {
    let file = LineFile::from_bytes(b"ok\r\n\xffz\r\n", LineTerminator::Crlf)?;
    let cfg = file.config().clone().with_encoding(TextEncoding::Utf8Lossy);
    let lines = read_range(file.path(), &Partition::new(0, 0, None), &cfg, &CancelToken::new())?;
    assert_eq!(lines, vec!["ok", "\u{FFFD}z", ""]);
    Ok(())
}

#[test]
fn bom_is_stripped_only_at_file_start() -> Result<()> {
    let cfg = ReadConfig::default();
    let head = decode_lines(b"\xEF\xBB\xBFa\r\nb", &Partition::new(0, 0, None), &cfg)?;
    assert_eq!(head, vec!["a", "b"]);

    let mid = decode_lines(b"\xEF\xBB\xBFy", &Partition::new(1, 3, None), &cfg)?;
    assert_eq!(mid, vec!["\u{FEFF}y"]);
    Ok(())
}

#[test]
fn bom_offset_counts_toward_decode_offset() {
    let err = decode_lines(
        b"\xEF\xBB\xBFab\xff",
        &Partition::new(0, 0, None),
        &ReadConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ReadError::Decode { offset: 5, .. }));
}

#[test]
fn lf_convention_leaves_carriage_returns_in_lines() -> Result<()> {
    let cfg = ReadConfig::default().with_terminator(LineTerminator::Lf);
    let lines = decode_lines(b"a\r\nb\n", &Partition::new(0, 0, Some(5)), &cfg)?;
    assert_eq!(lines, vec!["a\r", "b"]);
    Ok(())
}

#[test]
fn cancelled_token_stops_the_read() -> Result<()> {
    let file = LineFile::from_bytes(EXAMPLE, LineTerminator::Crlf)?;
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = read_range(file.path(), &Partition::new(0, 0, None), file.config(), &cancel)
        .unwrap_err();
    assert!(matches!(err, ReadError::Cancelled));
    Ok(())
}

#[test]
fn lower_index_failure_cancels_higher_partitions() -> Result<()> {
    let file = LineFile::from_bytes(EXAMPLE, LineTerminator::Crlf)?;
    let cancel = CancelToken::new().scoped(None);
    cancel.record_failure(1);

    let below = read_range(file.path(), &Partition::new(0, 0, Some(6)), file.config(), &cancel)?;
    assert_eq!(below, vec!["a", "b"]);

    let above = read_range(file.path(), &Partition::new(2, 6, None), file.config(), &cancel)
        .unwrap_err();
    assert!(matches!(above, ReadError::Cancelled));
    Ok(())
}
