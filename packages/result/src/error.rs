//! Error types for result tree addressing, type resolution and error scanning

use crate::arena::TreeId;
use std::fmt;
use thiserror::Error;

/// Result type for result tree operations
pub type ResultResult<T> = Result<T, ResultError>;

/// Why one hop of a nested entry path could not be followed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingCause {
    IndexOutOfRange { index: usize, count: usize },
    MissingSubResult { index: usize },
}

impl fmt::Display for AddressingCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressingCause::IndexOutOfRange { index, count } => {
                write!(f, "index {} is out of range (entry count {})", index, count)
            }
            AddressingCause::MissingSubResult { index } => {
                write!(f, "entry {} has no sub-result", index)
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResultError {
    #[error("Cannot address entry path {path:?} at hop {hop}: {cause}")]
    Addressing {
        path: Vec<usize>,
        hop: usize,
        cause: AddressingCause,
    },

    #[error("Unknown type '{name}' referenced at {position}")]
    UnknownType { name: String, position: usize },

    #[error("Fatal error at {position}: {message}")]
    FatalError { message: String, position: usize },

    #[error("Entry ending at {end} would end before the tree end at {previous}")]
    NonMonotonicEntry { end: usize, previous: usize },

    #[error("Tree {tree} is not a temporary result")]
    NotATemporary { tree: TreeId },

    #[error("Tree {base} is not on the base chain of temporary {temporary}")]
    UnrelatedBase { base: TreeId, temporary: TreeId },

    #[error("Type '{type_name}' failed to compile: {message}")]
    Compile { type_name: String, message: String },
}

impl ResultError {
    pub fn addressing(path: &[usize], hop: usize, cause: AddressingCause) -> Self {
        Self::Addressing {
            path: path.to_vec(),
            hop,
            cause,
        }
    }

    pub fn unknown_type(name: impl Into<String>, position: usize) -> Self {
        Self::UnknownType {
            name: name.into(),
            position,
        }
    }

    pub fn fatal_error(message: impl Into<String>, position: usize) -> Self {
        Self::FatalError {
            message: message.into(),
            position,
        }
    }

    pub fn compile(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Compile {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}
