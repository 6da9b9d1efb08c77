//! Structured diagnostics. Three severities plus a `Note` that never stands
//! alone — every `Note` is attached to a primary `Diagnostic`, following
//! two conventional note shapes: "The symbol X was originally declared
//! here" and "Strict mode is triggered by ... here".
//!
//! Diagnostics are span-carrying, severity-tagged, and chainable, built on
//! `miette` for rich rendering with `thiserror` covering the handful of
//! plain leaf error types that don't need it.

use jsc_rowan::TextRange;
use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

#[derive(Debug, Clone)]
pub struct Note {
    pub message: String,
    pub range: Option<TextRange>,
}

/// One parser/validator/mangler/lowerer diagnostic. `format!`s to a
/// `"<path>: ERROR|WARNING|NOTE: <message>"` line format, one message per
/// line, notes immediately following their primary.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub range: Option<TextRange>,
    pub notes: Vec<Note>,
}

impl MietteDiagnostic for Diagnostic {
    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
            Severity::Note => miette::Severity::Advice,
        })
    }
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            range: Some(range),
            notes: Vec::new(),
        }
    }

    pub fn warning(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            range: Some(range),
            notes: Vec::new(),
        }
    }

    /// Escalates a warning into an error under strict/module mode (spec
    /// §4.2 "Strict mode and module mode ... retroactively escalates
    /// earlier warnings into errors"). The note points at whatever made the
    /// file strict.
    pub fn escalate(mut self, strict_note: Note) -> Self {
        self.severity = Severity::Error;
        self.notes.push(strict_note);
        self
    }

    pub fn with_note(mut self, message: impl Into<String>, range: Option<TextRange>) -> Self {
        self.notes.push(Note {
            message: message.into(),
            range,
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render as a one-line-per-message string. `path` is supplied by the
    /// host (this crate never touches the filesystem).
    pub fn render_lines(&self, path: &str) -> String {
        let mut out = String::new();
        let tag = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Note => "NOTE",
        };
        out.push_str(&format!("{path}: {tag}: {}\n", self.message));
        for note in &self.notes {
            out.push_str(&format!("{path}: NOTE: {}\n", note.message));
        }
        out
    }
}

/// Diagnostics are pushed in source order, with the finalization pass's
/// diagnostics appended strictly after every inline-pass diagnostic (spec
/// §5 "Ordering guarantees").
#[derive(Debug, Default, Clone)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
    /// Index past which `run_finalization_pass` is allowed to append;
    /// asserted in debug builds to catch accidental interleaving.
    inline_pass_end: Option<usize>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        debug_assert!(
            self.inline_pass_end.is_none(),
            "pushed an inline-pass diagnostic after the finalization pass started"
        );
        self.diagnostics.push(diagnostic);
    }

    pub fn begin_finalization_pass(&mut self) {
        self.inline_pass_end = Some(self.diagnostics.len());
    }

    pub fn push_finalization(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Lets the finalization pass retroactively escalate a warning raised
    /// during the inline pass once it learns the file is a module (spec
    /// §4.2 "Strict/module mode ... retroactively escalates earlier
    /// warnings into errors").
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Diagnostic> {
        self.diagnostics.iter_mut()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn truncate(&mut self, len: usize) {
        self.diagnostics.truncate(len);
    }

    pub fn render(&self, path: &str) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.render_lines(path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsc_rowan::TextRange;

    fn range() -> TextRange {
        TextRange::empty(0u32.into())
    }

    #[test]
    fn render_lines_formats_path_severity_and_message() {
        let diagnostic = Diagnostic::error("\"x\" has already been declared", range());
        assert_eq!(
            diagnostic.render_lines("<stdin>"),
            "<stdin>: ERROR: \"x\" has already been declared\n"
        );
    }

    #[test]
    fn notes_render_immediately_after_their_primary() {
        let diagnostic = Diagnostic::error("\"x\" has already been declared", range())
            .with_note("The symbol \"x\" was originally declared here:", Some(range()));
        let rendered = diagnostic.render_lines("<stdin>");
        let mut lines = rendered.lines();
        assert_eq!(lines.next().unwrap(), "<stdin>: ERROR: \"x\" has already been declared");
        assert_eq!(
            lines.next().unwrap(),
            "<stdin>: NOTE: The symbol \"x\" was originally declared here:"
        );
    }

    #[test]
    fn escalate_turns_a_warning_into_an_error_and_attaches_a_note() {
        let warning = Diagnostic::warning("legacy octal literal", range());
        let escalated = warning.escalate(Note {
            message: "strict mode is triggered by the \"use strict\" directive here".to_string(),
            range: Some(range()),
        });
        assert_eq!(escalated.severity, Severity::Error);
        assert!(escalated.is_error());
        assert_eq!(escalated.notes.len(), 1);
    }

    #[test]
    fn sink_orders_finalization_diagnostics_after_inline_ones() {
        let mut sink = DiagnosticSink::new();
        sink.push(Diagnostic::error("inline", range()));
        sink.begin_finalization_pass();
        sink.push_finalization(Diagnostic::error("finalization", range()));
        let messages: Vec<&str> = sink.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["inline", "finalization"]);
    }

    #[test]
    fn has_errors_ignores_warnings_and_notes() {
        let mut sink = DiagnosticSink::new();
        sink.push(Diagnostic::warning("just a warning", range()));
        assert!(!sink.has_errors());
        sink.push(Diagnostic::error("now an error", range()));
        assert!(sink.has_errors());
    }

    #[test]
    fn truncate_discards_diagnostics_raised_after_a_checkpoint() {
        let mut sink = DiagnosticSink::new();
        sink.push(Diagnostic::error("kept", range()));
        let checkpoint = sink.len();
        sink.push(Diagnostic::error("discarded", range()));
        sink.truncate(checkpoint);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.iter().next().unwrap().message, "kept");
    }
}
