//! Line terminator detection and splitting.
//!
//! [`TerminatorScanner`] finds the end of the next terminator in a stream of chunks.
//! It remembers a trailing `\r` between calls, so a `\r\n` pair split across two
//! buffer reads is still found.

use crate::config::LineTerminator;
use memchr::memchr;

/// Incremental terminator search over consecutive chunks of one byte stream.
#[derive(Clone, Copy, Debug)]
pub struct TerminatorScanner {
    terminator: LineTerminator,
    pending_cr: bool,
}

impl TerminatorScanner {
    #[must_use]
    pub fn new(terminator: LineTerminator) -> Self {
        Self {
            terminator,
            pending_cr: false,
        }
    }

    /// Whether the last byte fed was a `\r` still waiting for its `\n`.
    #[must_use]
    pub fn pending_cr(&self) -> bool {
        self.pending_cr
    }

    /// Feed the next chunk. Returns the index of the terminator's final byte within
    /// `chunk`, if the terminator completes inside it.
    pub fn feed(&mut self, chunk: &[u8]) -> Option<usize> {
        if chunk.is_empty() {
            return None;
        }
        match self.terminator {
            LineTerminator::Lf => memchr(b'\n', chunk),
            LineTerminator::Crlf => {
                let mut from = 0;
                while let Some(rel) = memchr(b'\n', &chunk[from..]) {
                    let at = from + rel;
                    let preceded_by_cr = if at == 0 {
                        self.pending_cr
                    } else {
                        chunk[at - 1] == b'\r'
                    };
                    if preceded_by_cr {
                        self.pending_cr = false;
                        return Some(at);
                    }
                    from = at + 1;
                }
                self.pending_cr = chunk[chunk.len() - 1] == b'\r';
                None
            }
        }
    }
}

/// Split decoded partition text into lines.
///
/// A non-final partition always ends with a terminator. That terminator is removed
/// before splitting so no empty element appears at a partition seam. The final
/// partition keeps the behaviour of `str::split`, trailing empty element included.
#[must_use]
pub fn split_lines(text: &str, terminator: LineTerminator, is_final: bool) -> Vec<String> {
    let delim = terminator.as_str();
    let body = if is_final {
        text
    } else {
        text.strip_suffix(delim).unwrap_or(text)
    };
    body.split(delim).map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_split_across_chunks() {
        let mut s = TerminatorScanner::new(LineTerminator::Crlf);
        assert_eq!(s.feed(b"abc\r"), None);
        assert!(s.pending_cr());
        assert_eq!(s.feed(b"\nxyz"), Some(0));
        assert!(!s.pending_cr());
    }

    #[test]
    fn bare_lf_is_not_crlf() {
        let mut s = TerminatorScanner::new(LineTerminator::Crlf);
        assert_eq!(s.feed(b"a\nb\r"), None);
        assert_eq!(s.feed(b"x\n"), None);
        assert_eq!(s.feed(b"\r\n"), Some(1));
    }

    #[test]
    fn cr_not_followed_by_lf_clears_pending() {
        let mut s = TerminatorScanner::new(LineTerminator::Crlf);
        assert_eq!(s.feed(b"\r"), None);
        assert_eq!(s.feed(b"q"), None);
        assert!(!s.pending_cr());
        assert_eq!(s.feed(b"\n"), None);
    }

    #[test]
    fn lf_mode_finds_first_newline() {
        let mut s = TerminatorScanner::new(LineTerminator::Lf);
        assert_eq!(s.feed(b"ab\ncd\n"), Some(2));
    }

    #[test]
    fn split_final_keeps_trailing_empty() {
        assert_eq!(
            split_lines("c\r\nd\r\n", LineTerminator::Crlf, true),
            vec!["c", "d", ""]
        );
        assert_eq!(split_lines("", LineTerminator::Crlf, true), vec![""]);
    }

    #[test]
    fn split_inner_drops_seam_terminator() {
        assert_eq!(
            split_lines("a\r\nb\r\n", LineTerminator::Crlf, false),
            vec!["a", "b"]
        );
        assert_eq!(split_lines("\r\n", LineTerminator::Crlf, false), vec![""]);
    }
}
