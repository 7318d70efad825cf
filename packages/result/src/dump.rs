//! Human-readable dump of a tree, one line per entry.
//!
//! ```text
//! 0 - => [    2] = #Head           :                 = "ab"
//! 1 -- => [    6] = #Group          :                 = "(cd)"
//! .0 - => [    3] =                 :                 = "("
//! ```
//!
//! The dashes grow with the depth of the entry's sub-result, and every line
//! of a nested tree is prefixed with one `.` per enclosing level.

use crate::tree::TreeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DumpOptions {
    /// Width the end position is right-justified in
    pub position_width: usize,
    /// Width the capture name is left-justified in
    pub name_width: usize,
    /// Width the type name is left-justified in
    pub type_width: usize,
    /// Append the escaped text of each entry
    pub show_text: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            position_width: 5,
            name_width: 16,
            type_width: 16,
            show_text: true,
        }
    }
}

impl DumpOptions {
    /// No column padding
    pub fn compact() -> Self {
        Self {
            position_width: 0,
            name_width: 0,
            type_width: 0,
            show_text: true,
        }
    }
}

/// [`fmt::Display`] adapter produced by [`TreeRef::display`]
pub struct TreeDump<'a> {
    tree: TreeRef<'a>,
    options: DumpOptions,
}

impl fmt::Display for TreeDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tree(f, self.tree, 0, &self.options)
    }
}

fn write_tree(
    f: &mut fmt::Formatter<'_>,
    tree: TreeRef<'_>,
    level: usize,
    options: &DumpOptions,
) -> fmt::Result {
    let index_width = tree.entry_count().saturating_sub(1).to_string().len();
    let dots = ".".repeat(level);

    for (index, entry) in tree.entries().enumerate() {
        let sub = entry.sub_result().map(|id| tree.arena().tree(id));
        let dashes = "-".repeat(1 + sub.map_or(0, |sub| sub.depth()));
        let name = entry.capture().map(ToString::to_string).unwrap_or_default();
        let type_name = entry
            .type_capture()
            .map(ToString::to_string)
            .unwrap_or_default();

        write!(
            f,
            "{dots}{index:0index_width$} {dashes} => [{end:>position_width$}] = {name:<name_width$}:{type_name:<type_width$}",
            end = entry.end_position(),
            position_width = options.position_width,
            name_width = options.name_width,
            type_width = options.type_width,
        )?;
        if options.show_text {
            write!(f, " = \"{}\"", escape(tree.text_of(index).unwrap_or_default()))?;
        }
        writeln!(f)?;

        if let Some(sub) = sub {
            write_tree(f, sub, level + 1, options)?;
        }
    }
    Ok(())
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl<'a> TreeRef<'a> {
    pub fn display(&self, options: DumpOptions) -> TreeDump<'a> {
        TreeDump {
            tree: *self,
            options,
        }
    }

    pub fn dump(&self) -> String {
        self.dump_with(DumpOptions::default())
    }

    pub fn dump_with(&self, options: DumpOptions) -> String {
        self.display(options).to_string()
    }
}
