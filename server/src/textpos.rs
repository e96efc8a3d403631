//! Line table: the bridge between LSP's line/UTF-16 coordinates and the
//! analyzer's UTF-8 byte offsets.
//!
//! Every coordinate transition goes through this table; nothing in the
//! server assumes ASCII. Conversions are total on valid inputs and
//! return `None` for out-of-range or mid-scalar requests, never a clamp.

use std::sync::Arc;

/// One line: where it starts, how many content bytes it has, and how
/// many terminator bytes follow (`0`, `1` for `\n`, `2` for `\r\n`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineSpan {
    start: usize,
    content_len: usize,
    terminator_len: usize,
}

/// An indexed view of the lines of a UTF-8 buffer.
///
/// Line indices and columns are 0-based. Columns are UTF-16 code-unit
/// counts as LSP mandates: astral-plane scalars occupy two units.
#[derive(Debug, Clone)]
pub struct LineTable {
    text: Arc<str>,
    lines: Vec<LineSpan>,
}

impl LineTable {
    #[must_use]
    pub fn new(text: Arc<str>) -> Self {
        let bytes = text.as_bytes();
        let mut lines = Vec::new();
        let mut start = 0;
        for (i, &b) in bytes.iter().enumerate() {
            if b == b'\n' {
                let term_start = if i > start && bytes[i - 1] == b'\r' {
                    i - 1
                } else {
                    i
                };
                lines.push(LineSpan {
                    start,
                    content_len: term_start - start,
                    terminator_len: i + 1 - term_start,
                });
                start = i + 1;
            }
        }
        // Final line, possibly empty.
        lines.push(LineSpan {
            start,
            content_len: bytes.len() - start,
            terminator_len: 0,
        });
        Self { text, lines }
    }

    #[must_use]
    pub fn text(&self) -> &Arc<str> {
        &self.text
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The content slice of `line`, terminator excluded.
    #[must_use]
    pub fn line_content(&self, line: u32) -> Option<&str> {
        let span = self.lines.get(line as usize)?;
        Some(&self.text[span.start..span.start + span.content_len])
    }

    /// UTF-8 byte offset of `(line, utf16_col)`. The end-of-line column
    /// (equal to the line's UTF-16 length) is valid; anything past it, or
    /// landing between the two units of a surrogate pair, is not.
    #[must_use]
    pub fn utf8_offset(&self, line: u32, utf16_col: u32) -> Option<usize> {
        let span = self.lines.get(line as usize)?;
        let content = &self.text[span.start..span.start + span.content_len];
        let mut units: u32 = 0;
        for (idx, ch) in content.char_indices() {
            if units == utf16_col {
                return Some(span.start + idx);
            }
            units += ch.len_utf16() as u32;
            if units > utf16_col {
                return None;
            }
        }
        (units == utf16_col).then_some(span.start + span.content_len)
    }

    /// `(line, utf16_col)` of a UTF-8 byte offset. Offsets inside a line
    /// terminator (past its first byte) or mid-scalar are not present.
    #[must_use]
    pub fn line_and_utf16_col(&self, offset: usize) -> Option<(u32, u32)> {
        if offset > self.text.len() {
            return None;
        }
        let line = self.lines.partition_point(|span| span.start <= offset) - 1;
        let span = self.lines[line];
        let rel = offset - span.start;
        if rel > span.content_len {
            return None;
        }
        let content = &self.text[span.start..span.start + span.content_len];
        let mut units: u32 = 0;
        for (idx, ch) in content.char_indices() {
            if idx == rel {
                return Some((line as u32, units));
            }
            if idx > rel {
                return None;
            }
            units += ch.len_utf16() as u32;
        }
        (rel == span.content_len).then_some((line as u32, units))
    }

    /// UTF-16 column for a UTF-8 byte column within `line`.
    #[must_use]
    pub fn utf16_col(&self, line: u32, utf8_col: usize) -> Option<u32> {
        let span = self.lines.get(line as usize)?;
        if utf8_col > span.content_len {
            return None;
        }
        let content = &self.text[span.start..span.start + span.content_len];
        let mut units: u32 = 0;
        for (idx, ch) in content.char_indices() {
            if idx == utf8_col {
                return Some(units);
            }
            if idx > utf8_col {
                return None;
            }
            units += ch.len_utf16() as u32;
        }
        (utf8_col == span.content_len).then_some(units)
    }
}
