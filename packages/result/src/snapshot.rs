//! Owned, serializable copies of result trees.
//!
//! A snapshot no longer depends on the arena, so it can be exported, kept
//! after the arena is gone, or compared structurally.

use crate::tree::TreeRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSnapshot {
    pub start_position: usize,
    pub end_position: usize,
    pub entries: Vec<EntrySnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySnapshot {
    pub start_position: usize,
    pub end_position: usize,
    /// Capture name with its collapse marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_result: Option<ResultSnapshot>,
}

impl ResultSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Entry count including every nested snapshot
    pub fn total_entries(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| 1 + entry.sub_result.as_ref().map_or(0, Self::total_entries))
            .sum()
    }
}

impl<'a> TreeRef<'a> {
    pub fn to_snapshot(&self) -> ResultSnapshot {
        let entries = self
            .entries()
            .enumerate()
            .map(|(index, entry)| EntrySnapshot {
                start_position: self.start_position_of(index).unwrap_or_default(),
                end_position: entry.end_position(),
                name: entry.capture().map(ToString::to_string),
                type_name: entry.type_capture().map(ToString::to_string),
                parameter: entry.parameter().map(str::to_string),
                text: self.text_of(index).unwrap_or_default().to_string(),
                sub_result: entry
                    .sub_result()
                    .map(|sub| self.arena().tree(sub).to_snapshot()),
            })
            .collect();

        ResultSnapshot {
            start_position: self.start_position(),
            end_position: self.end_position(),
            entries,
        }
    }
}
