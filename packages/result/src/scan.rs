//! Scanning a finished tree for match-level warnings and errors.
//!
//! Markers are data, not failures: an entry is a marker when its capture
//! name carries one of the reserved prefixes below, or when its type
//! resolves to an error type. Only a fatal marker stops a scan.

use crate::diagnostic::{CompilationContext, Diagnostic, DiagnosticLevel};
use crate::entry::MatchEntry;
use crate::error::{ResultError, ResultResult};
use crate::tree::TreeRef;
use crate::types::TypeProvider;
use regparser_location::LineMap;
use std::ops::ControlFlow;
use tracing::{error, instrument, warn};

pub const WARNING_PREFIX: &str = "$WARNING_";
pub const ERROR_PREFIX: &str = "$ERROR_";
pub const FATAL_ERROR_PREFIX: &str = "$FATAL_ERROR_";

/// Level and message encoded by a reserved capture name
pub fn marker_of(name: &str) -> Option<(DiagnosticLevel, &str)> {
    let prefixes = [
        (FATAL_ERROR_PREFIX, DiagnosticLevel::FatalError),
        (ERROR_PREFIX, DiagnosticLevel::Error),
        (WARNING_PREFIX, DiagnosticLevel::Warning),
    ];
    prefixes
        .into_iter()
        .find_map(|(prefix, level)| name.strip_prefix(prefix).map(|message| (level, message)))
}

struct Marker<'a> {
    tree: TreeRef<'a>,
    index: usize,
    level: DiagnosticLevel,
    marker: &'a str,
    message: &'a str,
}

fn marker_at<'a>(
    tree: TreeRef<'a>,
    index: usize,
    entry: &'a MatchEntry,
    types: Option<&dyn TypeProvider>,
) -> ResultResult<Option<Marker<'a>>> {
    if let Some((name, (level, message))) = entry.name().and_then(|n| Some((n, marker_of(n)?))) {
        return Ok(Some(Marker {
            tree,
            index,
            level,
            marker: name,
            message,
        }));
    }

    let (Some(types), Some(type_name)) = (types, entry.type_name()) else {
        return Ok(None);
    };
    let ty = types.type_named(type_name).ok_or_else(|| {
        ResultError::unknown_type(type_name, tree.start_position_of(index).unwrap_or_default())
    })?;
    if !ty.is_error() {
        return Ok(None);
    }

    let message = match entry.parameter() {
        Some(parameter) => parameter,
        None => tree.text_of(index).unwrap_or_default(),
    };
    Ok(Some(Marker {
        tree,
        index,
        level: DiagnosticLevel::Error,
        marker: type_name,
        message,
    }))
}

/// Visit every marker depth-first, in entry order
fn walk<'a>(
    tree: TreeRef<'a>,
    types: Option<&dyn TypeProvider>,
    visit: &mut dyn FnMut(Marker<'a>) -> ResultResult<ControlFlow<()>>,
) -> ResultResult<ControlFlow<()>> {
    for (index, entry) in tree.entries().enumerate() {
        if let Some(marker) = marker_at(tree, index, entry, types)? {
            if visit(marker)?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        if let Some(sub) = entry.sub_result() {
            if walk(tree.arena().tree(sub), types, visit)?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
    }
    Ok(ControlFlow::Continue(()))
}

impl<'a> TreeRef<'a> {
    /// Whether the tree holds no error or fatal marker; warnings are ignored.
    ///
    /// With `types`, typed entries are resolved too, and a type that cannot
    /// be resolved is an error.
    pub fn has_no_error(&self, types: Option<&dyn TypeProvider>) -> ResultResult<bool> {
        let mut clean = true;
        walk(*self, types, &mut |marker| {
            if marker.level >= DiagnosticLevel::Error {
                clean = false;
                return Ok(ControlFlow::Break(()));
            }
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(clean)
    }

    /// Report every marker to `context`.
    ///
    /// Returns whether no error marker was found. The first fatal marker is
    /// reported and then ends the scan with [`ResultError::FatalError`].
    #[instrument(skip(self, types, context), fields(tree = %self.id()))]
    pub fn ensure_no_error(
        &self,
        types: Option<&dyn TypeProvider>,
        context: &mut dyn CompilationContext,
    ) -> ResultResult<bool> {
        let lines = LineMap::new(self.original_text());
        let mut clean = true;
        let mut fatal = None;

        walk(*self, types, &mut |marker| {
            let position = marker.tree.start_position_of(marker.index).unwrap_or_default();
            let text = marker.tree.text_of(marker.index).unwrap_or_default();
            let snippet = marker.tree.location_of(marker.index).unwrap_or_default();
            let location = lines.position(position);
            let diagnostic = Diagnostic::new(marker.level, marker.marker, marker.message, position)
                .with_text(text)
                .with_snippet(snippet);

            match marker.level {
                DiagnosticLevel::Warning => {
                    warn!(marker = marker.marker, ?location, "warning marker");
                }
                DiagnosticLevel::Error => {
                    warn!(marker = marker.marker, ?location, "error marker");
                    clean = false;
                }
                DiagnosticLevel::FatalError => {
                    error!(marker = marker.marker, ?location, "fatal marker, aborting scan");
                    fatal = Some(ResultError::fatal_error(marker.message, position));
                    context.report(diagnostic);
                    return Ok(ControlFlow::Break(()));
                }
            }
            context.report(diagnostic);
            Ok(ControlFlow::Continue(()))
        })?;

        match fatal {
            Some(err) => Err(err),
            None => Ok(clean),
        }
    }
}
