//! Byte offset utilities
//!
//! [`LineIndex`] converts byte offsets to 1-based line numbers with a binary
//! search over line starts, and knows where every `\r\n` pair sits so that
//! offsets can be reported as if the file used bare `\n` line endings.

use std::fmt;

/// Line/column position, both 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offsets where each line starts
    line_starts: Vec<usize>,
    /// Byte offsets of the `\r` of every `\r\n` pair
    crlf_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        let mut crlf_starts = Vec::new();
        let bytes = source.as_bytes();

        for (byte_pos, byte) in bytes.iter().enumerate() {
            if *byte == b'\n' {
                line_starts.push(byte_pos + 1);
                if byte_pos > 0 && bytes[byte_pos - 1] == b'\r' {
                    crlf_starts.push(byte_pos - 1);
                }
            }
        }

        Self {
            line_starts,
            crlf_starts,
        }
    }

    pub fn position(&self, byte_offset: usize) -> Position {
        let line = self
            .line_starts
            .binary_search(&byte_offset)
            .unwrap_or_else(|i| i - 1);
        Position::new(line, byte_offset - self.line_starts[line])
    }

    /// 1-based line number of a byte offset
    pub fn line_number(&self, byte_offset: usize) -> u32 {
        self.position(byte_offset).line as u32 + 1
    }

    /// Number of complete `\r\n` pairs in `source[..byte_offset]`
    pub fn crlf_before(&self, byte_offset: usize) -> usize {
        self.crlf_starts.partition_point(|&start| start + 2 <= byte_offset)
    }

    /// The offset as it would be with every `\r\n` replaced by `\n`
    pub fn normalized(&self, byte_offset: usize) -> usize {
        byte_offset - self.crlf_before(byte_offset)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_numbers() {
        let index = LineIndex::new("ab\ncd\nef");
        assert_eq!(index.line_number(0), 1);
        assert_eq!(index.line_number(2), 1);
        assert_eq!(index.line_number(3), 2);
        assert_eq!(index.line_number(7), 3);
        assert_eq!(index.position(4), Position::new(1, 1));
    }

    #[test]
    fn test_crlf_counts_only_complete_pairs() {
        let index = LineIndex::new("a\r\nb\r\nc");
        assert_eq!(index.crlf_before(0), 0);
        // cut between \r and \n
        assert_eq!(index.crlf_before(2), 0);
        assert_eq!(index.crlf_before(3), 1);
        assert_eq!(index.crlf_before(7), 2);
        assert_eq!(index.normalized(6), 4);
    }

    #[test]
    fn test_crlf_and_lf_line_numbers_agree() {
        let lf = LineIndex::new("a\nb\nc");
        let crlf = LineIndex::new("a\r\nb\r\nc");
        assert_eq!(lf.line_number(4), crlf.line_number(6));
        assert_eq!(lf.line_count(), crlf.line_count());
    }
}
