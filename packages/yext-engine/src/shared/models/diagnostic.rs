//! Collected (non-fatal) resolution diagnostics
//!
//! Everything that goes wrong inside a resolve pass short of an entry point's
//! own path validation is recorded as a [`Diagnostic`] and travels with the
//! result instead of aborting the pass.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::span::Span;
use crate::errors::YextError;

/// Diagnostic categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Malformed or duplicate directives
    Directive,
    /// Sandbox, extension or missing-file problems of an import
    Path,
    /// Unknown alias, bad path, type mismatch, forward reference
    Expression,
    /// Import cycle
    Cycle,
    /// Unknown tag or failing tag hook
    Tag,
    /// Underlying YAML syntax error
    Parse,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Directive => "directive",
            DiagnosticKind::Path => "path",
            DiagnosticKind::Expression => "expression",
            DiagnosticKind::Cycle => "cycle",
            DiagnosticKind::Tag => "tag",
            DiagnosticKind::Parse => "parse",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// One collected problem, anchored to a document and (usually) a range in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub path: PathBuf,
    /// Logical name declared with `%FILENAME`, preferred when rendering
    pub filename: Option<String>,
    pub span: Option<Span>,
    /// Full import cycle, first and last element equal
    pub cycle: Option<Vec<PathBuf>>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            path: path.into(),
            filename: None,
            span: None,
            cycle: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_filename(mut self, filename: Option<&str>) -> Self {
        self.filename = filename.map(str::to_string);
        self
    }

    pub fn as_warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    // Convenience constructors
    pub fn directive(path: &Path, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Directive, path, message)
    }

    pub fn expression(path: &Path, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Expression, path, message)
    }

    pub fn tag(path: &Path, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Tag, path, message)
    }

    pub fn parse(path: &Path, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Parse, path, message)
    }

    pub fn cycle(path: &Path, cycle: Vec<PathBuf>) -> Self {
        let mut diagnostic = Self::new(
            DiagnosticKind::Cycle,
            path,
            format!("circular import: {}", render_cycle(&cycle)),
        );
        diagnostic.cycle = Some(cycle);
        diagnostic
    }

    /// Turn a fatal error of an import attempt into a diagnostic of the
    /// importing document.
    pub fn from_error(path: &Path, error: &YextError) -> Self {
        match error {
            YextError::Cycle { cycle } => Self::cycle(path, cycle.clone()),
            other => Self::new(DiagnosticKind::Path, path, other.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_cycle(&self) -> bool {
        self.kind == DiagnosticKind::Cycle
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filename {
            Some(name) => write!(f, "{}", name)?,
            None => write!(f, "{}", self.path.display())?,
        }
        if let Some(span) = self.span {
            write!(f, ":{}:{}", span.line, span.column)?;
        }
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, ": {} [{}]: {}", severity, self.kind.as_str(), self.message)
    }
}

pub(crate) fn render_cycle(cycle: &[PathBuf]) -> String {
    cycle
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
