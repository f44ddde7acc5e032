//! Diagnostic formatting for CLI output
//!
//! This module implements diagnostic emitters for different output formats:
//! - `TerminalEmitter`: rustc-style output to stderr
//! - `JsonEmitter`: machine-readable JSON output
//!
//! Both emitters support:
//! - `--strict` mode: escalates warnings to errors
//! - `--quiet` mode: suppresses all output except errors
//!
//! ## Exit Code Semantics
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success: no errors (warnings/hints/info allowed) |
//! | 1 | Failure: one or more errors emitted, or a fatal error |
//!
//! `--quiet` never changes the exit code, only what is shown.

use std::io::Write;
use std::path::PathBuf;
use std::process;

use budgetdoc_core::{Diagnostic, DiagnosticEmitter, Severity};
use serde::Serialize;

// ============================================================================
// Exit Code
// ============================================================================

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success: no errors (warnings/hints/info allowed)
    Success = 0,
    /// Failure: one or more errors emitted
    Failure = 1,
}

impl ExitCode {
    /// Determine exit code from error count (after policy)
    pub fn from_error_count(count: usize) -> Self {
        if count > 0 {
            ExitCode::Failure
        } else {
            ExitCode::Success
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code as u8)
    }
}

// ============================================================================
// Diagnostic Config
// ============================================================================

/// The `--strict` and `--quiet` switches of `generate`
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticConfig {
    /// Warnings count as errors, so nothing is written
    pub strict: bool,
    /// Only errors are shown
    pub quiet: bool,
}

impl DiagnosticConfig {
    /// Severity after `--strict`
    pub fn effective_severity(self, severity: Severity) -> Severity {
        match severity {
            Severity::Warning if self.strict => Severity::Error,
            s => s,
        }
    }

    pub fn should_show(self, severity: Severity) -> bool {
        !self.quiet || matches!(self.effective_severity(severity), Severity::Error)
    }
}

// ============================================================================
// Terminal
// ============================================================================

/// Terminal emitter that outputs rustc-style diagnostics
pub struct TerminalEmitter<W: Write> {
    writer: W,
    config: DiagnosticConfig,
    /// Input file every diagnostic refers to
    source: Option<PathBuf>,
    error_count: usize,
    warning_count: usize,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W, config: DiagnosticConfig) -> Self {
        Self {
            writer,
            config,
            source: None,
            error_count: 0,
            warning_count: 0,
        }
    }

    /// Point diagnostics at the input file
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// Exit code based on emitted diagnostics (after policy)
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from_error_count(self.error_count)
    }

    fn write_diagnostic(&mut self, diagnostic: &Diagnostic) -> std::io::Result<()> {
        let effective_severity = self.config.effective_severity(diagnostic.severity);

        // Counted even when quiet hides them
        match effective_severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            _ => {}
        }

        if !self.config.should_show(diagnostic.severity) {
            return Ok(());
        }

        // Header line: severity[CODE]: message
        writeln!(
            self.writer,
            "{}[{}]: {}",
            effective_severity.as_str(),
            diagnostic.code.as_str(),
            diagnostic.message
        )?;

        if let Some(source) = &self.source {
            writeln!(self.writer, "  --> {}", source.display())?;
        }

        if !diagnostic.notes.is_empty() {
            writeln!(self.writer, "   |")?;
            for note in &diagnostic.notes {
                writeln!(self.writer, "   = {}", note)?;
            }
        }

        for hint in &diagnostic.hints {
            writeln!(self.writer, "   = hint: {}", hint)?;
        }

        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        // Ignore write errors in emit (stderr may be closed)
        let _ = self.write_diagnostic(&diagnostic);
    }
}

// ============================================================================
// JSON
// ============================================================================

/// JSON emitter that collects diagnostics in machine-readable form
pub struct JsonEmitter {
    diagnostics: Vec<JsonDiagnostic>,
    config: DiagnosticConfig,
    source: Option<PathBuf>,
    error_count: usize,
}

/// JSON representation of a diagnostic
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub code: String,
    pub severity: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

impl JsonEmitter {
    pub fn new(config: DiagnosticConfig) -> Self {
        Self {
            diagnostics: Vec::new(),
            config,
            source: None,
            error_count: 0,
        }
    }

    /// Point diagnostics at the input file
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn diagnostics(&self) -> &[JsonDiagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Exit code based on collected diagnostics (after policy)
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from_error_count(self.error_count)
    }

    /// Convert to JSON value for inclusion in command output
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(&self.diagnostics).unwrap_or(serde_json::Value::Null)
    }
}

impl DiagnosticEmitter for JsonEmitter {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let effective_severity = self.config.effective_severity(diagnostic.severity);
        if effective_severity == Severity::Error {
            self.error_count += 1;
        }

        if !self.config.should_show(diagnostic.severity) {
            return;
        }

        self.diagnostics.push(JsonDiagnostic {
            code: diagnostic.code.as_str().to_string(),
            severity: effective_severity.as_str().to_string(),
            message: diagnostic.message,
            file: self.source.as_ref().map(|p| p.display().to_string()),
            notes: diagnostic.notes,
            hints: diagnostic.hints,
        });
    }
}

// ============================================================================
// Either
// ============================================================================

/// The emitter selected by `--format`
pub enum Emitter<W: Write> {
    Terminal(TerminalEmitter<W>),
    Json(JsonEmitter),
}

impl<W: Write> Emitter<W> {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Emitter::Terminal(e) => e.exit_code(),
            Emitter::Json(e) => e.exit_code(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.exit_code().is_success()
    }

    /// Collected JSON diagnostics; empty for the terminal emitter
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            Emitter::Terminal(_) => serde_json::Value::Array(Vec::new()),
            Emitter::Json(e) => e.to_json_value(),
        }
    }
}

impl<W: Write> DiagnosticEmitter for Emitter<W> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        match self {
            Emitter::Terminal(e) => e.emit(diagnostic),
            Emitter::Json(e) => e.emit(diagnostic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetdoc_core::DiagnosticCode;

    const STRICT: DiagnosticConfig = DiagnosticConfig {
        strict: true,
        quiet: false,
    };
    const QUIET: DiagnosticConfig = DiagnosticConfig {
        strict: false,
        quiet: true,
    };

    fn make_test_diagnostic() -> Diagnostic {
        Diagnostic::new(
            DiagnosticCode::W001DroppedRows,
            "2 rows without director or month were left out of the report",
        )
        .with_note("rows: 4, 7")
        .with_hint("fill in Director and Mes for these rows")
    }

    fn missing_columns() -> Diagnostic {
        Diagnostic::new(
            DiagnosticCode::E001MissingColumns,
            "missing required columns: Valor",
        )
    }

    #[test]
    fn terminal_emitter_basic_output() {
        let mut output = Vec::new();
        let mut emitter = TerminalEmitter::new(&mut output, DiagnosticConfig::default())
            .with_source("/data/presupuesto.xlsx");

        emitter.emit(make_test_diagnostic());
        drop(emitter);

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("warning[W001]"));
        assert!(output_str.contains("2 rows without director"));
        assert!(output_str.contains("  --> /data/presupuesto.xlsx"));
        assert!(output_str.contains("   = rows: 4, 7"));
        assert!(output_str.contains("   = hint: fill in Director"));
    }

    #[test]
    fn strict_only_escalates_warnings() {
        assert_eq!(STRICT.effective_severity(Severity::Warning), Severity::Error);
        assert_eq!(STRICT.effective_severity(Severity::Hint), Severity::Hint);
        assert_eq!(STRICT.effective_severity(Severity::Info), Severity::Info);
        assert!(!QUIET.should_show(Severity::Warning));
        assert!(QUIET.should_show(Severity::Error));
    }

    #[test]
    fn terminal_emitter_strict_mode() {
        let mut output = Vec::new();
        let mut emitter = TerminalEmitter::new(&mut output, STRICT);

        emitter.emit(make_test_diagnostic());

        assert_eq!(emitter.error_count(), 1);
        assert_eq!(emitter.warning_count(), 0);
        drop(emitter);

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("error[W001]"));
    }

    #[test]
    fn terminal_emitter_quiet_mode() {
        let mut output = Vec::new();
        let mut emitter = TerminalEmitter::new(&mut output, QUIET);

        emitter.emit(make_test_diagnostic());
        assert_eq!(emitter.warning_count(), 1);
        drop(emitter);

        assert!(output.is_empty());
    }

    #[test]
    fn terminal_emitter_quiet_shows_errors() {
        let mut output = Vec::new();
        let mut emitter = TerminalEmitter::new(&mut output, QUIET);

        emitter.emit(missing_columns());
        drop(emitter);

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("error[E001]: missing required columns: Valor"));
    }

    #[test]
    fn json_emitter_basic_output() {
        let mut emitter = JsonEmitter::new(DiagnosticConfig::default()).with_source("in.csv");

        emitter.emit(make_test_diagnostic());

        let diagnostics = emitter.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "W001");
        assert_eq!(diagnostics[0].severity, "warning");
        assert_eq!(diagnostics[0].file.as_deref(), Some("in.csv"));
    }

    #[test]
    fn json_emitter_strict_mode() {
        let mut emitter = JsonEmitter::new(STRICT);
        emitter.emit(make_test_diagnostic());
        assert_eq!(emitter.diagnostics()[0].severity, "error");
        assert_eq!(emitter.exit_code(), ExitCode::Failure);
    }

    #[test]
    fn json_emitter_quiet_mode_keeps_exit_code() {
        let config = DiagnosticConfig {
            strict: true,
            quiet: true,
        };
        let mut emitter = JsonEmitter::new(config);
        emitter.emit(make_test_diagnostic());
        // Shown (it is an error after escalation) and counted
        assert_eq!(emitter.diagnostics().len(), 1);
        assert_eq!(emitter.exit_code(), ExitCode::Failure);
    }

    #[test]
    fn json_emitter_to_json_value() {
        let mut emitter = JsonEmitter::new(DiagnosticConfig::default());
        emitter.emit(make_test_diagnostic());

        let json = emitter.to_json_value();
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["code"], "W001");
        assert!(arr[0].get("file").is_none());
    }

    #[test]
    fn info_diagnostic_unchanged_in_strict() {
        let mut emitter = JsonEmitter::new(STRICT);
        emitter.emit(Diagnostic::new(
            DiagnosticCode::I001CoercedAmounts,
            "3 amounts were not numeric and count as 0",
        ));
        assert_eq!(emitter.diagnostics()[0].severity, "info");
        assert_eq!(emitter.exit_code(), ExitCode::Success);
    }

    // =========================================================================
    // Exit Code Tests
    // =========================================================================

    #[test]
    fn exit_code_from_counts() {
        assert_eq!(ExitCode::from_error_count(0), ExitCode::Success);
        assert_eq!(ExitCode::from_error_count(3), ExitCode::Failure);
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::Failure.code(), 1);
    }

    #[test]
    fn warnings_alone_succeed() {
        let mut output = Vec::new();
        let mut emitter = TerminalEmitter::new(&mut output, DiagnosticConfig::default());
        emitter.emit(make_test_diagnostic());
        assert_eq!(emitter.exit_code(), ExitCode::Success);
    }

    #[test]
    fn errors_fail() {
        let mut emitter: Emitter<Vec<u8>> =
            Emitter::Terminal(TerminalEmitter::new(Vec::new(), DiagnosticConfig::default()));
        emitter.emit(missing_columns());
        assert!(emitter.has_errors());
        assert_eq!(emitter.to_json_value(), serde_json::json!([]));
    }
}
