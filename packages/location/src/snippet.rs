//! "Line + caret" rendering of an offset for diagnostics.
//!
//! The output is compared verbatim by downstream tooling:
//!
//! ```text
//! <char> : (<row>,<col>)
//!
//! 	-|<previous line>
//! 	-|<current line>
//! 	-|<padding>^-- At the end of the line
//! ```
//!
//! The previous line is omitted on the first row and the end-of-line marker
//! only appears when the offset sits on a line terminator or the end of the
//! text, in which case the caret moves back onto the last character of the
//! line.

use crate::position::{floor_char_boundary, is_line_break, is_line_terminator, map_offset};
use serde::{Deserialize, Serialize};

pub const END_OF_LINE_MARKER: &str = "-- At the end of the line";

/// Stands in for a character or coordinate that does not exist
pub const UNKNOWN_SYMBOL: &str = "?";

const LINE_PREFIX: &str = "\t-|";

/// Options for snippet rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnippetOptions {
    /// Include the line before the one holding the offset
    pub show_previous_line: bool,
}

impl Default for SnippetOptions {
    fn default() -> Self {
        Self {
            show_previous_line: true,
        }
    }
}

impl SnippetOptions {
    /// Only the current line and the caret
    pub fn single_line() -> Self {
        Self {
            show_previous_line: false,
        }
    }
}

/// Render `offset` within `text` with the default options
pub fn render_snippet(text: &str, offset: usize) -> String {
    render_snippet_with(text, offset, &SnippetOptions::default())
}

pub fn render_snippet_with(text: &str, offset: usize, options: &SnippetOptions) -> String {
    let Some(position) = map_offset(text, offset).filter(|_| offset <= text.len()) else {
        return format!("{UNKNOWN_SYMBOL} : ({UNKNOWN_SYMBOL},{UNKNOWN_SYMBOL})\n");
    };

    let offset = floor_char_boundary(text, offset);
    let line_start = line_start_before(text, offset);
    let line_end = line_end_after(text, line_start);

    let mut caret = offset;
    let at_line_end = caret >= line_end;
    if at_line_end && line_end > line_start {
        caret = floor_char_boundary(text, line_end - 1);
    }

    let mut out = format!("{} : {}\n\n", describe_char(text, offset), position);

    if options.show_previous_line && line_start > 0 {
        let previous_end = terminator_start(text, line_start);
        let previous_start = line_start_before(text, previous_end);
        out.push_str(LINE_PREFIX);
        out.push_str(&text[previous_start..previous_end]);
        out.push('\n');
    }

    out.push_str(LINE_PREFIX);
    out.push_str(&text[line_start..line_end]);
    out.push('\n');

    out.push_str(LINE_PREFIX);
    for ch in text[line_start..caret.min(line_end)].chars() {
        out.push(if ch == '\t' { '\t' } else { ' ' });
    }
    out.push('^');
    if at_line_end {
        out.push_str(END_OF_LINE_MARKER);
    }
    out.push('\n');
    out
}

/// Start of the row containing `offset`
fn line_start_before(text: &str, offset: usize) -> usize {
    let bytes = text.as_bytes();
    (0..offset)
        .rev()
        .find(|&i| is_line_break(bytes, i))
        .map_or(0, |i| i + 1)
}

/// First line terminator at or after `line_start`, or the end of the text
fn line_end_after(text: &str, line_start: usize) -> usize {
    text.as_bytes()[line_start..]
        .iter()
        .position(|&b| is_line_terminator(b))
        .map_or(text.len(), |i| line_start + i)
}

/// Where the terminator that ends just before `next_line_start` begins
fn terminator_start(text: &str, next_line_start: usize) -> usize {
    let bytes = text.as_bytes();
    let end = next_line_start - 1;
    if bytes[end] == b'\n' && end > 0 && bytes[end - 1] == b'\r' {
        end - 1
    } else {
        end
    }
}

fn describe_char(text: &str, offset: usize) -> String {
    match text[offset..].chars().next() {
        Some('\n') => "\\n".to_string(),
        Some('\r') => "\\r".to_string(),
        Some('\t') => "\\t".to_string(),
        Some(ch) => ch.to_string(),
        None => UNKNOWN_SYMBOL.to_string(),
    }
}
