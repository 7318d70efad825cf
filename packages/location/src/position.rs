//! Offset to (column, row) mapping over LF, CR and CRLF line endings

use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-based column and row of an offset in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub col: usize,
    pub row: usize,
}

impl Position {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Map a byte offset to its (column, row) with a single forward scan.
///
/// A row boundary is a `\n`, or a `\r` that is not immediately followed by
/// `\n`, so LF, CR and CRLF texts number their rows identically. Columns
/// count characters. Offsets past the end are clamped to the last
/// character. Returns `None` for empty text.
pub fn map_offset(text: &str, offset: usize) -> Option<Position> {
    if text.is_empty() {
        return None;
    }
    if offset == 0 {
        return Some(Position::new(0, 0));
    }

    let offset = clamp_offset(text, offset);
    let bytes = text.as_bytes();
    let mut position = Position::new(0, 0);
    for (i, _) in text[..offset].char_indices() {
        if is_line_break(bytes, i) {
            position.row += 1;
            position.col = 0;
        } else {
            position.col += 1;
        }
    }
    Some(position)
}

/// Precomputed row starts for repeated lookups over the same text.
///
/// Agrees with [`map_offset`] for every offset.
#[derive(Debug, Clone)]
pub struct LineMap<'a> {
    text: &'a str,
    /// Byte offsets where each row starts; `line_starts[0]` is always 0
    line_starts: Vec<usize>,
}

impl<'a> LineMap<'a> {
    pub fn new(text: &'a str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![0];
        for (i, _) in text.char_indices() {
            if is_line_break(bytes, i) {
                line_starts.push(i + 1);
            }
        }
        Self { text, line_starts }
    }

    pub fn position(&self, offset: usize) -> Option<Position> {
        if self.text.is_empty() {
            return None;
        }

        let offset = clamp_offset(self.text, offset);
        let row = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let col = self.text[self.line_starts[row]..offset].chars().count();
        Some(Position::new(col, row))
    }

    /// Number of rows, counting a trailing empty row after a final line break
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn text(&self) -> &'a str {
        self.text
    }
}

/// True when the byte at `index` ends a row
pub(crate) fn is_line_break(bytes: &[u8], index: usize) -> bool {
    match bytes.get(index) {
        Some(b'\n') => true,
        Some(b'\r') => bytes.get(index + 1) != Some(&b'\n'),
        _ => false,
    }
}

pub(crate) fn is_line_terminator(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

/// Clamp to the last character and round down to a char boundary
fn clamp_offset(text: &str, offset: usize) -> usize {
    floor_char_boundary(text, offset.min(text.len() - 1))
}

pub(crate) fn floor_char_boundary(text: &str, mut offset: usize) -> usize {
    if offset >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
