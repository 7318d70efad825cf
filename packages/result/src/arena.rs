//! Storage for every result tree of a match attempt.
//!
//! Trees live in a [`ResultArena`] and refer to each other by [`TreeId`].
//! Ownership flows one way: a tree owns its entries, and an entry's
//! sub-result id names the node tree holding the nested group. A node's
//! parent id is a back-reference used only to delegate text and name
//! lookups, so the parent/child cycle never becomes an ownership cycle and
//! re-parenting on merge is a plain field update.

use crate::entry::MatchEntry;
use crate::error::{ResultError, ResultResult};
use crate::tree::TreeRef;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Handle to a tree stored in a [`ResultArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(usize);

impl TreeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a tree obtains its start position and original text
#[derive(Debug, Clone)]
pub enum TreeKind {
    /// Outermost tree; owns the original text
    Root { text: Arc<str>, start: usize },
    /// Sub-tree of a nested group; text and names come through `parent`
    Node { parent: TreeId, start: usize },
    /// Tentative entries appended after everything `first` holds
    Temporary { first: TreeId },
}

#[derive(Debug, Clone)]
pub(crate) struct TreeData {
    pub(crate) kind: TreeKind,
    pub(crate) entries: Vec<MatchEntry>,
}

#[derive(Debug, Default)]
pub struct ResultArena {
    trees: Vec<TreeData>,
}

impl ResultArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of trees ever allocated, discarded temporaries included
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Read view of a tree.
    ///
    /// # Panics
    /// If `id` was not allocated by this arena.
    pub fn tree(&self, id: TreeId) -> TreeRef<'_> {
        TreeRef::new(self, id)
    }

    pub fn kind(&self, id: TreeId) -> &TreeKind {
        &self.trees[id.0].kind
    }

    /// A root over `text` whose first entry starts at offset 0
    pub fn new_root(&mut self, text: impl Into<Arc<str>>) -> TreeId {
        self.new_root_at(text, 0)
    }

    /// A root over `text` whose first entry starts at `start`
    pub fn new_root_at(&mut self, text: impl Into<Arc<str>>, start: usize) -> TreeId {
        self.alloc(TreeKind::Root {
            text: text.into(),
            start,
        })
    }

    /// A node for a group that begins where `parent` currently ends
    pub fn new_node(&mut self, parent: TreeId) -> TreeId {
        let start = self.tree(parent).end_position();
        self.new_node_at(parent, start)
    }

    pub fn new_node_at(&mut self, parent: TreeId, start: usize) -> TreeId {
        self.alloc(TreeKind::Node { parent, start })
    }

    /// A temporary accumulating entries on top of `first` without touching it
    pub fn new_temporary(&mut self, first: TreeId) -> TreeId {
        self.alloc(TreeKind::Temporary { first })
    }

    /// Append an entry and return its index in the tree.
    ///
    /// Entries must not end before the tree's current end.
    pub fn push_entry(&mut self, id: TreeId, entry: MatchEntry) -> ResultResult<usize> {
        let tree = self.tree(id);
        let previous = tree.end_position();
        if entry.end_position() < previous {
            return Err(ResultError::NonMonotonicEntry {
                end: entry.end_position(),
                previous,
            });
        }

        let index = tree.entry_count();
        self.trees[id.0].entries.push(entry);
        Ok(index)
    }

    /// Truncate the tree to its first `count` entries.
    ///
    /// A temporary only drops its own entries; its base is never modified.
    pub fn reset(&mut self, id: TreeId, count: usize) {
        let base_count = self.base_count(id);
        let own = &mut self.trees[id.0].entries;
        own.truncate(count.saturating_sub(base_count));
    }

    /// Copy a tree so that later changes to either side stay invisible to the
    /// other.
    ///
    /// The entry list is copied and the original text shared. Every node
    /// reachable through a sub-result is copied as well, with its parent
    /// pointing at the copy that now owns it, so collapsing or merging one
    /// side never reaches into the other. A temporary chain is flattened in
    /// one pass: the entries of every link are gathered root-to-tip into a
    /// single temporary over one duplicate of the chain's base, so the cost
    /// follows the number of entries rather than chain depth times size.
    pub fn duplicate(&mut self, id: TreeId) -> TreeId {
        let mut links = Vec::new();
        let mut base = id;
        while let TreeKind::Temporary { first } = self.trees[base.0].kind {
            links.push(base);
            base = first;
        }

        let base_copy = self.copy_tree(base, None);
        if links.is_empty() {
            return base_copy;
        }

        let total = links.iter().map(|link| self.trees[link.0].entries.len()).sum();
        let mut entries = Vec::with_capacity(total);
        for link in links.iter().rev() {
            entries.extend(self.trees[link.0].entries.iter().cloned());
        }
        debug!(tree = %id, depth = links.len(), entries = total, "duplicated temporary chain");

        let copy = self.alloc(TreeKind::Temporary { first: base_copy });
        self.trees[copy.0].entries = self.copy_sub_results(entries, copy);
        copy
    }

    /// Copy one tree and its nested nodes; a node copy is re-parented to
    /// `parent` when one is given
    fn copy_tree(&mut self, id: TreeId, parent: Option<TreeId>) -> TreeId {
        let TreeData { mut kind, entries } = self.trees[id.0].clone();
        if let (TreeKind::Node { parent: owner, .. }, Some(parent)) = (&mut kind, parent) {
            *owner = parent;
        }
        let copy = self.alloc(kind);
        self.trees[copy.0].entries = self.copy_sub_results(entries, copy);
        copy
    }

    fn copy_sub_results(&mut self, mut entries: Vec<MatchEntry>, owner: TreeId) -> Vec<MatchEntry> {
        for entry in &mut entries {
            if let Some(sub) = entry.sub_result() {
                let copy = self.copy_tree(sub, Some(owner));
                entry.set_sub_result(Some(copy));
            }
        }
        entries
    }

    /// Commit the entries accumulated by `temporary` into `base`.
    ///
    /// Entries are moved from every temporary in the chain above `base`, so
    /// the temporary keeps reading the same entries through its base
    /// afterwards. Every moved entry whose sub-result is a node is
    /// re-parented to `base`. Returns the number of entries moved, or an
    /// error when `base` is not on the temporary's chain.
    pub fn merge_with(&mut self, base: TreeId, temporary: TreeId) -> ResultResult<usize> {
        if !matches!(self.trees[temporary.0].kind, TreeKind::Temporary { .. }) {
            return Err(ResultError::NotATemporary { tree: temporary });
        }

        let mut links = Vec::new();
        let mut current = temporary;
        loop {
            let TreeKind::Temporary { first } = self.trees[current.0].kind else {
                return Err(ResultError::UnrelatedBase { base, temporary });
            };
            links.push(current);
            if first == base {
                break;
            }
            current = first;
        }

        let first_end = links
            .iter()
            .rev()
            .find_map(|link| self.trees[link.0].entries.first())
            .map(MatchEntry::end_position);
        let previous = self.tree(base).end_position();
        if let Some(end) = first_end.filter(|&end| end < previous) {
            return Err(ResultError::NonMonotonicEntry { end, previous });
        }

        let mut moved = Vec::new();
        for link in links.iter().rev() {
            moved.append(&mut self.trees[link.0].entries);
        }

        let mut rebound = 0;
        for sub in moved.iter().filter_map(MatchEntry::sub_result) {
            if self.rebind_parent(sub, base) {
                rebound += 1;
            }
        }

        let count = moved.len();
        self.trees[base.0].entries.append(&mut moved);
        trace!(base = %base, temporary = %temporary, entries = count, rebound, "merged temporary");
        Ok(count)
    }

    /// Point a node at a new parent; other tree kinds are left alone
    pub(crate) fn rebind_parent(&mut self, id: TreeId, new_parent: TreeId) -> bool {
        match &mut self.trees[id.0].kind {
            TreeKind::Node { parent, .. } => {
                *parent = new_parent;
                true
            }
            _ => false,
        }
    }

    /// Entries reachable through a temporary's base, 0 for other kinds
    pub(crate) fn base_count(&self, id: TreeId) -> usize {
        match self.trees[id.0].kind {
            TreeKind::Temporary { first } => self.tree(first).entry_count(),
            _ => 0,
        }
    }

    /// Translate a tree-level index into an index of the tree's own entries
    pub(crate) fn own_index(&self, id: TreeId, index: usize) -> Option<usize> {
        let own = index.checked_sub(self.base_count(id))?;
        (own < self.trees[id.0].entries.len()).then_some(own)
    }

    pub(crate) fn data(&self, id: TreeId) -> &TreeData {
        &self.trees[id.0]
    }

    pub(crate) fn entries_mut(&mut self, id: TreeId) -> &mut Vec<MatchEntry> {
        &mut self.trees[id.0].entries
    }

    fn alloc(&mut self, kind: TreeKind) -> TreeId {
        self.push_tree(TreeData {
            kind,
            entries: Vec::new(),
        })
    }

    fn push_tree(&mut self, data: TreeData) -> TreeId {
        let id = TreeId(self.trees.len());
        self.trees.push(data);
        id
    }
}
