//! Reports produced when a tree is scanned for match-level error markers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a reported marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Warning,
    Error,
    FatalError,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Warning => write!(f, "warning"),
            DiagnosticLevel::Error => write!(f, "error"),
            DiagnosticLevel::FatalError => write!(f, "fatal error"),
        }
    }
}

/// One marker found in a result tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub level: DiagnosticLevel,

    /// Capture or type name that marked the entry
    pub marker: String,

    /// Human-readable message, the marker with its prefix removed
    pub message: String,

    /// Offset in the original text where the marked entry starts
    pub position: usize,

    /// Text matched by the marked entry
    pub text: String,

    /// Rendered source snippet pointing at `position`
    pub snippet: String,
}

impl Diagnostic {
    pub fn new(
        level: DiagnosticLevel,
        marker: impl Into<String>,
        message: impl Into<String>,
        position: usize,
    ) -> Self {
        Self {
            level,
            marker: marker.into(),
            message: message.into(),
            position,
            text: String::new(),
            snippet: String::new(),
        }
    }

    pub fn warning(marker: impl Into<String>, message: impl Into<String>, position: usize) -> Self {
        Self::new(DiagnosticLevel::Warning, marker, message, position)
    }

    pub fn error(marker: impl Into<String>, message: impl Into<String>, position: usize) -> Self {
        Self::new(DiagnosticLevel::Error, marker, message, position)
    }

    pub fn fatal(marker: impl Into<String>, message: impl Into<String>, position: usize) -> Self {
        Self::new(DiagnosticLevel::FatalError, marker, message, position)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.level == DiagnosticLevel::FatalError
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.level, self.message, self.position)?;
        if !self.snippet.is_empty() {
            write!(f, "\n{}", self.snippet)?;
        }
        Ok(())
    }
}

/// Receives the markers reported while a tree is checked or compiled
pub trait CompilationContext {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// A [`CompilationContext`] that keeps every report
#[derive(Debug, Default, Clone)]
pub struct DiagnosticCollector {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.level >= DiagnosticLevel::Error)
    }
}

impl CompilationContext for DiagnosticCollector {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Pretty-print diagnostics with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_diagnostics(source: &str, filename: &str, diagnostics: &[Diagnostic]) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let mut output = Vec::new();

    for diagnostic in diagnostics {
        // ariadne spans count chars
        let start = source
            .get(..diagnostic.position)
            .map_or(source.chars().count(), |prefix| prefix.chars().count());
        let end = start + diagnostic.text.chars().count().max(1);

        let (kind, color) = match diagnostic.level {
            DiagnosticLevel::Warning => (ReportKind::Warning, Color::Yellow),
            DiagnosticLevel::Error | DiagnosticLevel::FatalError => {
                (ReportKind::Error, Color::Red)
            }
        };

        let report = Report::build(kind, filename, start)
            .with_message(&diagnostic.message)
            .with_label(
                Label::new((filename, start..end))
                    .with_color(color)
                    .with_message(&diagnostic.marker),
            )
            .finish();

        if let Err(err) = report.write((filename, Source::from(source)), &mut output) {
            tracing::warn!(%err, "failed to render diagnostic");
        }
    }

    String::from_utf8(output).unwrap_or_else(|_| "Diagnostic formatting failed".to_string())
}
