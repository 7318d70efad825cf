pub mod arena;
pub mod entry;
pub mod error;
pub mod tree;
pub mod reparse;
pub mod types;
pub mod diagnostic;
pub mod scan;
pub mod dump;
pub mod snapshot;
mod collapse;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests_scenarios;

pub use arena::{ResultArena, TreeId, TreeKind};
pub use entry::{CaptureName, CollapseHint, MatchEntry};
pub use error::{AddressingCause, ResultError, ResultResult};
pub use tree::TreeRef;
pub use reparse::Grammar;
pub use types::{ErrorType, ParserType, TypeProvider, TypeRegistry, ERROR_TYPE_NAME};
pub use diagnostic::{CompilationContext, Diagnostic, DiagnosticCollector, DiagnosticLevel};
#[cfg(feature = "pretty-errors")]
pub use diagnostic::format_diagnostics;
pub use scan::{marker_of, ERROR_PREFIX, FATAL_ERROR_PREFIX, WARNING_PREFIX};
pub use dump::{DumpOptions, TreeDump};
pub use snapshot::{EntrySnapshot, ResultSnapshot};
pub use regparser_location::{Position, SnippetOptions};
