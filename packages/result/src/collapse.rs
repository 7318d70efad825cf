//! Post-match simplification of a finished tree.
//!
//! A collapse pass applies, in order:
//!
//! 1. adjacent entries carrying nothing but a span are merged;
//! 2. sub-results without any named or typed descendant are dropped, leaving
//!    the wrapping entry as a leaf, and the remaining sub-results collapse;
//! 3. adjacent leaf entries of the same collective capture are merged;
//! 4. entries carrying a second-stage grammar are re-parsed with it;
//! 5. flatten-marked entries are inlined, flatten-if-singleton ones only
//!    when their sub-result holds a single entry.
//!
//! Passes repeat until nothing changes, which makes collapse idempotent.

use crate::arena::{ResultArena, TreeId};
use crate::entry::{CollapseHint, MatchEntry};
use crate::types::TypeProvider;
use tracing::{debug, instrument, trace};

impl ResultArena {
    /// Replace entry `index` with the entries of its sub-result.
    ///
    /// Returns false when the entry has no sub-result.
    pub fn flatten(&mut self, id: TreeId, index: usize) -> bool {
        match self.own_index(id, index) {
            Some(own) => self.flatten_own(id, own),
            None => false,
        }
    }

    /// Simplify the tree in place; returns whether anything changed
    #[instrument(skip(self, id, types), fields(tree = %id))]
    pub fn collapse(&mut self, id: TreeId, types: Option<&dyn TypeProvider>) -> bool {
        let mut changed = false;
        let mut passes = 0;
        while self.collapse_pass(id, types) {
            changed = true;
            passes += 1;
        }
        if changed {
            debug!(tree = %id, passes, entries = self.data(id).entries.len(), "collapsed");
        }
        changed
    }

    fn collapse_pass(&mut self, id: TreeId, types: Option<&dyn TypeProvider>) -> bool {
        let mut changed = self.merge_plain_runs(id);
        changed |= self.drop_empty_groups(id, types);
        changed |= self.merge_collective_runs(id);
        changed |= self.apply_second_stages(id, types);
        changed |= self.flatten_marked(id);
        changed
    }

    fn flatten_own(&mut self, id: TreeId, own: usize) -> bool {
        let Some(sub) = self.data(id).entries[own].sub_result() else {
            return false;
        };

        let inlined: Vec<MatchEntry> = self.tree(sub).entries().cloned().collect();
        for nested in inlined.iter().filter_map(MatchEntry::sub_result) {
            self.rebind_parent(nested, id);
        }
        trace!(tree = %id, index = own, entries = inlined.len(), "flattened entry");
        self.entries_mut(id).splice(own..=own, inlined);
        true
    }

    fn merge_plain_runs(&mut self, id: TreeId) -> bool {
        self.merge_adjacent(id, |previous, entry| previous.is_plain() && entry.is_plain())
    }

    fn merge_collective_runs(&mut self, id: TreeId) -> bool {
        self.merge_adjacent(id, |previous, entry| {
            entry.has_hint(CollapseHint::Collective)
                && previous.same_identity(entry)
                && previous.sub_result().is_none()
                && entry.sub_result().is_none()
                && previous.second_stage().is_none()
                && entry.second_stage().is_none()
        })
    }

    /// Drop every entry for which `absorb(entry, next)` holds; the next
    /// entry then spans both
    fn merge_adjacent(
        &mut self,
        id: TreeId,
        absorb: impl Fn(&MatchEntry, &MatchEntry) -> bool,
    ) -> bool {
        let entries = self.entries_mut(id);
        let before = entries.len();
        let mut merged: Vec<MatchEntry> = Vec::with_capacity(before);
        for entry in std::mem::take(entries) {
            if merged.last().is_some_and(|previous| absorb(previous, &entry)) {
                merged.pop();
            }
            merged.push(entry);
        }
        let changed = merged.len() != before;
        *entries = merged;
        changed
    }

    fn drop_empty_groups(&mut self, id: TreeId, types: Option<&dyn TypeProvider>) -> bool {
        let mut changed = false;
        for own in 0..self.data(id).entries.len() {
            let Some(sub) = self.data(id).entries[own].sub_result() else {
                continue;
            };
            if self.has_captures(sub) {
                changed |= self.collapse(sub, types);
            } else {
                self.entries_mut(id)[own].set_sub_result(None);
                changed = true;
            }
        }
        changed
    }

    /// Whether any entry below `id` is named or typed
    fn has_captures(&self, id: TreeId) -> bool {
        self.tree(id).entries().any(|entry| {
            entry.name().is_some()
                || entry.type_name().is_some()
                || entry.sub_result().is_some_and(|sub| self.has_captures(sub))
        })
    }

    fn apply_second_stages(&mut self, id: TreeId, types: Option<&dyn TypeProvider>) -> bool {
        let base_count = self.base_count(id);
        let mut changed = false;
        for own in (0..self.data(id).entries.len()).rev() {
            let Some(grammar) = self.entries_mut(id)[own].take_second_stage() else {
                continue;
            };
            changed = true;
            self.reparse_entry(id, base_count + own, grammar.as_ref(), types);
        }
        changed
    }

    fn flatten_marked(&mut self, id: TreeId) -> bool {
        let mut changed = false;
        let mut own = 0;
        while own < self.data(id).entries.len() {
            let entry = &self.data(id).entries[own];
            let inlined = match entry.sub_result() {
                Some(sub) if entry.has_hint(CollapseHint::Flatten) => {
                    Some(self.tree(sub).entry_count())
                }
                Some(sub)
                    if entry.has_hint(CollapseHint::FlattenIfSingleton)
                        && self.tree(sub).entry_count() == 1 =>
                {
                    Some(1)
                }
                _ => None,
            };

            match inlined {
                Some(count) => {
                    self.flatten_own(id, own);
                    changed = true;
                    own += count;
                }
                None => own += 1,
            }
        }
        changed
    }
}
