//! Diagnostic accumulation with per-statement suppression.

use quill_diagnostics::{Diagnostic, DiagnosticCollection};

/// Collects binder diagnostics and tracks validity.
///
/// Only the first error inside one statement is recorded; anything after it
/// is usually a consequence. Once any statement fails the whole tree stays
/// invalid.
#[derive(Debug)]
pub struct BindReporter {
    diagnostics: DiagnosticCollection,
    file: Option<String>,
    statement_valid: bool,
    tree_valid: bool,
}

impl BindReporter {
    pub fn new() -> Self {
        Self {
            diagnostics: DiagnosticCollection::new(),
            file: None,
            statement_valid: true,
            tree_valid: true,
        }
    }

    /// Tag subsequent diagnostics with `file`.
    pub fn set_file(&mut self, file: &str) {
        self.file = Some(file.to_string());
    }

    /// Start a statement. Returns the enclosing statement's state, to be
    /// handed back to [`BindReporter::exit_statement`].
    pub fn enter_statement(&mut self) -> bool {
        std::mem::replace(&mut self.statement_valid, true)
    }

    /// Finish a statement. A failed inner statement fails the enclosing one.
    pub fn exit_statement(&mut self, outer_valid: bool) {
        self.statement_valid = outer_valid && self.statement_valid;
    }

    /// Record an error unless the current statement already has one.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        if self.statement_valid {
            self.push(diagnostic);
        }
        self.invalidate();
    }

    /// Record a warning. Warnings neither suppress nor invalidate.
    pub fn warn(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }

    /// Mark the statement and tree invalid without a diagnostic, for
    /// errors already reported by the parser.
    pub fn invalidate(&mut self) {
        self.statement_valid = false;
        self.tree_valid = false;
    }

    #[cfg(test)]
    fn is_statement_valid(&self) -> bool {
        self.statement_valid
    }

    #[cfg(test)]
    fn is_tree_valid(&self) -> bool {
        self.tree_valid
    }

    pub fn finish(self) -> (DiagnosticCollection, bool) {
        let valid = self.tree_valid && !self.diagnostics.has_errors();
        (self.diagnostics, valid)
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        let diagnostic = match &self.file {
            Some(file) => diagnostic.in_file(file),
            None => diagnostic,
        };
        self.diagnostics.add(diagnostic);
    }
}

impl Default for BindReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::text::TextSpan;
    use quill_diagnostics::messages;

    fn error(name: &str) -> Diagnostic {
        Diagnostic::at(TextSpan::new(0, 1), &messages::UNRESOLVED_IDENTIFIER, &[name])
    }

    #[test]
    fn test_first_error_per_statement() {
        let mut reporter = BindReporter::new();
        let outer = reporter.enter_statement();
        reporter.report(error("a"));
        reporter.report(error("b"));
        reporter.exit_statement(outer);

        let next = reporter.enter_statement();
        reporter.report(error("c"));
        reporter.exit_statement(next);

        let (diagnostics, valid) = reporter.finish();
        assert!(!valid);
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_inner_failure_fails_outer() {
        let mut reporter = BindReporter::new();
        let outer = reporter.enter_statement();
        let inner = reporter.enter_statement();
        reporter.report(error("a"));
        reporter.exit_statement(inner);
        assert!(!reporter.is_statement_valid());
        reporter.exit_statement(outer);
        assert!(!reporter.is_statement_valid());
        assert!(!reporter.is_tree_valid());
    }

    #[test]
    fn test_warning_keeps_validity() {
        let mut reporter = BindReporter::new();
        reporter.warn(Diagnostic::at(
            TextSpan::new(0, 1),
            &messages::DIVISION_BY_CONSTANT_ZERO,
            &[],
        ));
        let (diagnostics, valid) = reporter.finish();
        assert!(valid);
        assert_eq!(diagnostics.len(), 1);
    }
}
