//! The per-step record stored by result trees

use crate::arena::TreeId;
use crate::reparse::Grammar;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How collapse treats an entry carrying this capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CollapseHint {
    #[default]
    None,
    /// The wrapping group is always inlined into its parent (`*`)
    Flatten,
    /// The wrapping group is inlined when it holds a single entry (`+`)
    FlattenIfSingleton,
    /// Adjacent leaf entries of the same capture are one value (`[]`)
    Collective,
}

impl CollapseHint {
    /// Grammar-level suffix encoding this hint
    pub fn marker(self) -> &'static str {
        match self {
            CollapseHint::None => "",
            CollapseHint::Flatten => "*",
            CollapseHint::FlattenIfSingleton => "+",
            CollapseHint::Collective => "[]",
        }
    }
}

/// A capture or type identity with its collapse hint split off
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureName {
    name: String,
    hint: CollapseHint,
}

impl CaptureName {
    pub fn new(name: impl Into<String>, hint: CollapseHint) -> Self {
        Self {
            name: name.into(),
            hint,
        }
    }

    /// Split a trailing `[]`, `*` or `+` marker off a grammar-level name
    pub fn parse(raw: &str) -> Self {
        let markers = [
            CollapseHint::Collective,
            CollapseHint::Flatten,
            CollapseHint::FlattenIfSingleton,
        ];
        for hint in markers {
            if let Some(name) = raw.strip_suffix(hint.marker()) {
                return Self::new(name, hint);
            }
        }
        Self::new(raw, CollapseHint::None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hint(&self) -> CollapseHint {
        self.hint
    }
}

impl fmt::Display for CaptureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.hint.marker())
    }
}

impl From<&str> for CaptureName {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for CaptureName {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

/// One recorded match step.
///
/// Only the end position is stored: an entry starts where the previous entry
/// of its tree ends, or at the tree's start position for the first entry.
#[derive(Debug, Clone)]
pub struct MatchEntry {
    end_position: usize,
    name: Option<CaptureName>,
    type_name: Option<CaptureName>,
    parameter: Option<String>,
    sub_result: Option<TreeId>,
    second_stage: Option<Arc<dyn Grammar>>,
}

impl MatchEntry {
    pub fn new(end_position: usize) -> Self {
        Self {
            end_position,
            name: None,
            type_name: None,
            parameter: None,
            sub_result: None,
            second_stage: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<CaptureName>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_type(mut self, type_name: impl Into<CaptureName>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    pub fn with_sub_result(mut self, sub_result: TreeId) -> Self {
        self.sub_result = Some(sub_result);
        self
    }

    pub fn with_second_stage(mut self, grammar: Arc<dyn Grammar>) -> Self {
        self.second_stage = Some(grammar);
        self
    }

    pub fn end_position(&self) -> usize {
        self.end_position
    }

    /// Capture name without its collapse marker
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().map(CaptureName::name)
    }

    pub fn capture(&self) -> Option<&CaptureName> {
        self.name.as_ref()
    }

    /// Type name without its collapse marker
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_ref().map(CaptureName::name)
    }

    pub fn type_capture(&self) -> Option<&CaptureName> {
        self.type_name.as_ref()
    }

    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }

    pub fn sub_result(&self) -> Option<TreeId> {
        self.sub_result
    }

    pub fn second_stage(&self) -> Option<&Arc<dyn Grammar>> {
        self.second_stage.as_ref()
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name() == Some(name)
    }

    /// True when either the capture or the type carries `hint`
    pub fn has_hint(&self, hint: CollapseHint) -> bool {
        self.name.as_ref().is_some_and(|n| n.hint() == hint)
            || self.type_name.as_ref().is_some_and(|t| t.hint() == hint)
    }

    /// Same capture and type, markers included
    pub fn same_identity(&self, other: &MatchEntry) -> bool {
        self.name == other.name && self.type_name == other.type_name
    }

    /// Carries nothing beyond its span
    pub fn is_plain(&self) -> bool {
        self.name.is_none()
            && self.type_name.is_none()
            && self.parameter.is_none()
            && self.sub_result.is_none()
            && self.second_stage.is_none()
    }

    pub(crate) fn set_sub_result(&mut self, sub_result: Option<TreeId>) {
        self.sub_result = sub_result;
    }

    pub(crate) fn take_second_stage(&mut self) -> Option<Arc<dyn Grammar>> {
        self.second_stage.take()
    }
}
