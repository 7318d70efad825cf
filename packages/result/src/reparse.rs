//! Second-stage parsing: re-deriving a span that was already captured.
//!
//! A grammar can capture a coarse span first and re-parse it with a finer
//! grammar once the surrounding context is known. The finer grammar's
//! entries replace the captured entry in place.

use crate::arena::{ResultArena, TreeId};
use crate::entry::MatchEntry;
use crate::types::TypeProvider;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The matching layer as seen by the result tree
pub trait Grammar: fmt::Debug + Send + Sync {
    /// Match `text` from `start` without matching past `end`.
    ///
    /// Returns a tree in `arena` whose entries carry offsets into `text`, or
    /// `None` when nothing matches.
    fn parse(
        &self,
        arena: &mut ResultArena,
        text: &Arc<str>,
        start: usize,
        end: usize,
        types: Option<&dyn TypeProvider>,
    ) -> Option<TreeId>;
}

impl ResultArena {
    /// Re-parse the text of entry `index` with `grammar` and splice the
    /// result in place.
    ///
    /// The grammar runs over the shared original text, from the entry's
    /// start and bounded by the entry's end. When the match reaches the entry's end the entry is
    /// replaced; otherwise the new entries go in front of it and the entry
    /// stays behind holding the unclaimed tail. Entries that already carry a
    /// sub-result are never re-parsed. Returns whether the tree changed.
    pub fn reparse_entry(
        &mut self,
        id: TreeId,
        index: usize,
        grammar: &dyn Grammar,
        types: Option<&dyn TypeProvider>,
    ) -> bool {
        let Some(own) = self.own_index(id, index) else {
            return false;
        };
        let tree = self.tree(id);
        let entry = &self.data(id).entries[own];
        if entry.sub_result().is_some() {
            return false;
        }

        let end = entry.end_position();
        let Some(start) = tree.start_position_of(index) else {
            return false;
        };
        let text = tree.shared_text().clone();
        if !text.is_char_boundary(end) {
            return false;
        }

        let Some(result) = grammar.parse(self, &text, start, end, types) else {
            debug!(tree = %id, index, start, end, "second stage did not match");
            return false;
        };

        let matched = self.tree(result);
        let matched_end = matched.end_position();
        let replacement: Vec<MatchEntry> = matched.entries().cloned().collect();
        if replacement.is_empty() || matched_end > end {
            return false;
        }

        for sub in replacement.iter().filter_map(MatchEntry::sub_result) {
            self.rebind_parent(sub, id);
        }

        let added = replacement.len();
        let entries = self.entries_mut(id);
        if matched_end == end {
            entries.splice(own..=own, replacement);
        } else {
            entries.splice(own..own, replacement);
        }
        debug!(tree = %id, index, start, matched_end, end, added, "spliced second stage");
        true
    }
}
