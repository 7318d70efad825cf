pub mod position;
pub mod snippet;

pub use position::{map_offset, LineMap, Position};
pub use snippet::{render_snippet, render_snippet_with, SnippetOptions, END_OF_LINE_MARKER, UNKNOWN_SYMBOL};
