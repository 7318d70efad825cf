//! Read-only queries over a result tree.
//!
//! A [`TreeRef`] answers the same questions for every tree kind: a temporary
//! reads through its base chain, and a node resolves its original text and
//! any name it does not hold itself through its parent.

use crate::arena::{ResultArena, TreeId, TreeKind};
use crate::entry::MatchEntry;
use crate::error::{AddressingCause, ResultError, ResultResult};
use regparser_location::{map_offset, render_snippet, Position};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy)]
pub struct TreeRef<'a> {
    arena: &'a ResultArena,
    id: TreeId,
}

impl fmt::Debug for TreeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeRef")
            .field("id", &self.id)
            .field("entries", &self.entry_count())
            .finish()
    }
}

impl<'a> TreeRef<'a> {
    pub(crate) fn new(arena: &'a ResultArena, id: TreeId) -> Self {
        Self { arena, id }
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn arena(&self) -> &'a ResultArena {
        self.arena
    }

    pub fn kind(&self) -> &'a TreeKind {
        self.arena.kind(self.id)
    }

    fn own_entries(&self) -> &'a [MatchEntry] {
        &self.arena.data(self.id).entries
    }

    fn first(&self) -> Option<TreeRef<'a>> {
        match self.kind() {
            TreeKind::Temporary { first } => Some(self.arena.tree(*first)),
            _ => None,
        }
    }

    /// First tree down the temporary chain that is not a temporary
    fn base(&self) -> TreeRef<'a> {
        let mut current = *self;
        while let Some(first) = current.first() {
            current = first;
        }
        current
    }

    pub fn entry_count(&self) -> usize {
        let mut count = self.own_entries().len();
        let mut current = *self;
        while let Some(first) = current.first() {
            count += first.own_entries().len();
            current = first;
        }
        count
    }

    /// Entry `index`, found by one walk down the temporary chain
    pub fn entry_at(&self, index: usize) -> Option<&'a MatchEntry> {
        let mut below = self.entry_count();
        if index >= below {
            return None;
        }
        let mut current = *self;
        loop {
            let own = current.own_entries();
            below -= own.len();
            if index >= below {
                return own.get(index - below);
            }
            current = current.first()?;
        }
    }

    /// All entries in order, reading through a temporary chain once
    pub fn entries(&self) -> impl Iterator<Item = &'a MatchEntry> + 'a {
        let mut links = vec![self.own_entries()];
        let mut current = *self;
        while let Some(first) = current.first() {
            links.push(first.own_entries());
            current = first;
        }
        links.into_iter().rev().flatten()
    }

    /// Entry reached by following sub-results along `path`
    pub fn entry_at_path(&self, path: &[usize]) -> ResultResult<&'a MatchEntry> {
        let (tree, index) = self.locate(path)?;
        tree.entry_at(index).ok_or_else(|| {
            ResultError::addressing(
                path,
                path.len() - 1,
                AddressingCause::IndexOutOfRange {
                    index,
                    count: tree.entry_count(),
                },
            )
        })
    }

    pub fn text_of_path(&self, path: &[usize]) -> ResultResult<&'a str> {
        let (tree, index) = self.locate(path)?;
        Ok(tree.text_of(index).unwrap_or_default())
    }

    /// Sub-result of the entry at `path`
    pub fn sub_result_at_path(&self, path: &[usize]) -> ResultResult<TreeRef<'a>> {
        let entry = self.entry_at_path(path)?;
        let sub = entry.sub_result().ok_or_else(|| {
            let hop = path.len() - 1;
            ResultError::addressing(
                path,
                hop,
                AddressingCause::MissingSubResult { index: path[hop] },
            )
        })?;
        Ok(self.arena.tree(sub))
    }

    /// Tree holding the last hop of `path` and the index within it
    fn locate(&self, path: &[usize]) -> ResultResult<(TreeRef<'a>, usize)> {
        let Some((&last, hops)) = path.split_last() else {
            return Err(ResultError::addressing(
                path,
                0,
                AddressingCause::IndexOutOfRange {
                    index: 0,
                    count: self.entry_count(),
                },
            ));
        };

        let mut tree = *self;
        for (hop, &index) in hops.iter().enumerate() {
            let entry = tree.entry_at(index).ok_or_else(|| {
                ResultError::addressing(
                    path,
                    hop,
                    AddressingCause::IndexOutOfRange {
                        index,
                        count: tree.entry_count(),
                    },
                )
            })?;
            let sub = entry.sub_result().ok_or_else(|| {
                ResultError::addressing(path, hop, AddressingCause::MissingSubResult { index })
            })?;
            tree = self.arena.tree(sub);
        }

        if last >= tree.entry_count() {
            return Err(ResultError::addressing(
                path,
                hops.len(),
                AddressingCause::IndexOutOfRange {
                    index: last,
                    count: tree.entry_count(),
                },
            ));
        }
        Ok((tree, last))
    }

    pub fn start_position(&self) -> usize {
        match self.base().kind() {
            TreeKind::Root { start, .. } | TreeKind::Node { start, .. } => *start,
            TreeKind::Temporary { .. } => 0,
        }
    }

    /// End of the last entry, or the start position of an empty tree
    pub fn end_position(&self) -> usize {
        let mut current = *self;
        loop {
            if let Some(entry) = current.own_entries().last() {
                return entry.end_position();
            }
            match current.first() {
                Some(first) => current = first,
                None => return current.start_position(),
            }
        }
    }

    /// Where entry `index` starts: the previous entry's end, or the tree's
    /// start position for the first entry
    pub fn start_position_of(&self, index: usize) -> Option<usize> {
        if index >= self.entry_count() {
            return None;
        }
        match index.checked_sub(1) {
            Some(previous) => self.end_position_of(previous),
            None => Some(self.start_position()),
        }
    }

    pub fn end_position_of(&self, index: usize) -> Option<usize> {
        self.entry_at(index).map(MatchEntry::end_position)
    }

    pub fn original_text(&self) -> &'a str {
        self.shared_text()
    }

    /// The original text as the root holds it
    pub fn shared_text(&self) -> &'a Arc<str> {
        let mut current = *self;
        loop {
            match current.kind() {
                TreeKind::Root { text, .. } => return text,
                TreeKind::Node { parent: next, .. } | TreeKind::Temporary { first: next } => {
                    current = self.arena.tree(*next)
                }
            }
        }
    }

    /// Text matched by entry `index`; empty when it matched nothing
    pub fn text_of(&self, index: usize) -> Option<&'a str> {
        let start = self.start_position_of(index)?;
        let end = self.end_position_of(index)?;
        if start >= end {
            return Some("");
        }
        self.original_text().get(start..end)
    }

    /// Text of the last entry named `name`, here or in an enclosing tree
    pub fn text_of_name(&self, name: &str) -> Option<&'a str> {
        let (tree, index) = self.resolve_name(name)?;
        tree.text_of(index)
    }

    /// Index of the last entry named `name`
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let entries: Vec<_> = self.entries().collect();
        entries.iter().rposition(|entry| entry.has_name(name))
    }

    pub fn indexes_of(&self, name: &str) -> Vec<usize> {
        self.entries()
            .enumerate()
            .filter(|(_, entry)| entry.has_name(name))
            .map(|(index, _)| index)
            .collect()
    }

    /// Indexes named `name` grouped into runs of consecutive entries.
    ///
    /// Any entry with another name, or none, ends a run.
    pub fn all_indexes_of(&self, name: &str) -> Vec<Vec<usize>> {
        let mut runs: Vec<Vec<usize>> = Vec::new();
        let mut previous = None;
        for index in self.indexes_of(name) {
            match runs.last_mut() {
                Some(run) if previous == Some(index - 1) => run.push(index),
                _ => runs.push(vec![index]),
            }
            previous = Some(index);
        }
        runs
    }

    /// Text of every entry named `name`, in order
    pub fn texts_of(&self, name: &str) -> Vec<&'a str> {
        self.indexes_of(name)
            .into_iter()
            .filter_map(|index| self.text_of(index))
            .collect()
    }

    /// Text spanned by each run of [`all_indexes_of`](Self::all_indexes_of)
    pub fn all_texts_of(&self, name: &str) -> Vec<&'a str> {
        self.all_indexes_of(name)
            .into_iter()
            .filter_map(|run| {
                let start = self.start_position_of(*run.first()?)?;
                let end = self.end_position_of(*run.last()?)?;
                self.original_text().get(start..end.max(start))
            })
            .collect()
    }

    /// Tree and index of the last entry named `name`, searching this tree
    /// and then its enclosing trees
    pub fn resolve_name(&self, name: &str) -> Option<(TreeRef<'a>, usize)> {
        match self.index_of(name) {
            Some(index) => Some((*self, index)),
            None => self.parent()?.resolve_name(name),
        }
    }

    /// Every capture name visible from this tree, enclosing trees included
    pub fn names(&self) -> BTreeSet<&'a str> {
        let mut names: BTreeSet<&'a str> = self.entries().filter_map(MatchEntry::name).collect();
        if let Some(parent) = self.parent() {
            names.extend(parent.names());
        }
        names
    }

    /// Enclosing tree of a node, seen through a temporary's base
    pub fn parent(&self) -> Option<TreeRef<'a>> {
        match self.base().kind() {
            TreeKind::Node { parent, .. } => Some(self.arena.tree(*parent)),
            _ => None,
        }
    }

    /// Index of the parent entry whose sub-result is this node
    pub fn index_in_parent(&self) -> Option<usize> {
        let TreeKind::Node { parent, .. } = self.kind() else {
            return None;
        };
        self.arena
            .tree(*parent)
            .entries()
            .position(|entry| entry.sub_result() == Some(self.id))
    }

    pub fn root(&self) -> TreeRef<'a> {
        let mut current = self.base();
        while let Some(parent) = current.parent() {
            current = parent.base();
        }
        current
    }

    /// 1 + the deepest sub-result, or 0 for a tree without entries
    pub fn depth(&self) -> usize {
        if self.entry_count() == 0 {
            return 0;
        }
        let nested = self
            .entries()
            .filter_map(MatchEntry::sub_result)
            .map(|sub| self.arena.tree(sub).depth())
            .max()
            .unwrap_or(0);
        nested + 1
    }

    pub fn name_of(&self, index: usize) -> Option<&'a str> {
        self.entry_at(index)?.name()
    }

    pub fn type_name_of(&self, index: usize) -> Option<&'a str> {
        self.entry_at(index)?.type_name()
    }

    pub fn parameter_of(&self, index: usize) -> Option<&'a str> {
        self.entry_at(index)?.parameter()
    }

    pub fn sub_result_of(&self, index: usize) -> Option<TreeRef<'a>> {
        let sub = self.entry_at(index)?.sub_result()?;
        Some(self.arena.tree(sub))
    }

    /// Row and column where entry `index` starts
    pub fn position_of(&self, index: usize) -> Option<Position> {
        map_offset(self.original_text(), self.start_position_of(index)?)
    }

    /// Source snippet pointing at where entry `index` starts
    pub fn location_of(&self, index: usize) -> Option<String> {
        Some(render_snippet(self.original_text(), self.start_position_of(index)?))
    }
}
