//! Diagnostics raised while building a report
//!
//! Nothing here aborts a run. Fatal conditions are errors
//! ([`crate::ResolveError`]); diagnostics describe what was degraded or left
//! out so the caller can decide how loud to be about it.

use serde::Serialize;

/// Severity of a diagnostic
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Hint,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Hint => "hint",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Stable diagnostic codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    /// Required columns could not be found
    E001MissingColumns,
    /// Rows without director or month were dropped
    W001DroppedRows,
    /// A director/month selection matched no records
    W002EmptySelection,
    /// Nothing left to render
    W003NoReportUnits,
    /// Non-numeric amounts were counted as zero
    I001CoercedAmounts,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::E001MissingColumns => "E001",
            DiagnosticCode::W001DroppedRows => "W001",
            DiagnosticCode::W002EmptySelection => "W002",
            DiagnosticCode::W003NoReportUnits => "W003",
            DiagnosticCode::I001CoercedAmounts => "I001",
        }
    }

    pub fn default_severity(self) -> Severity {
        match self {
            DiagnosticCode::E001MissingColumns => Severity::Error,
            DiagnosticCode::W001DroppedRows
            | DiagnosticCode::W002EmptySelection
            | DiagnosticCode::W003NoReportUnits => Severity::Warning,
            DiagnosticCode::I001CoercedAmounts => Severity::Info,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.default_severity(),
            message: message.into(),
            notes: Vec::new(),
            hints: Vec::new(),
        }
    }

    /// Diagnostic forced to error severity
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::new(code, message)
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Sink for diagnostics (terminal, JSON, test collector)
pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticEmitter for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}
