//! quill_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! Every problem the scanner, parser, or binder finds in user code is a
//! [`Diagnostic`] built from one of the fixed templates in [`messages`].
//! Diagnostics carry a code, a severity, the formatted message, and the
//! source location they point at.

use quill_core::text::{LineMap, TextSpan};
use std::fmt;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Warning,
    Error,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Warning => write!(f, "warning"),
            DiagnosticCategory::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message template with a code and category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    /// The diagnostic code (e.g., 1002, 2004).
    pub code: u32,
    /// The category of this diagnostic.
    pub category: DiagnosticCategory,
    /// The message template string. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The file this diagnostic occurred in, if any.
    pub file: Option<String>,
    /// The source text span this diagnostic points at, if any.
    pub span: Option<TextSpan>,
    /// The formatted message.
    pub message_text: String,
    /// The diagnostic code.
    pub code: u32,
    /// The category.
    pub category: DiagnosticCategory,
}

impl Diagnostic {
    /// Create a new diagnostic without location info.
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            file: None,
            span: None,
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
        }
    }

    /// Create a new diagnostic pointing at `span`.
    pub fn at(span: TextSpan, message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            span: Some(span),
            ..Self::new(message, args)
        }
    }

    /// Create a new diagnostic with file and span info.
    pub fn with_location(
        file: String,
        span: TextSpan,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self {
            file: Some(file),
            span: Some(span),
            ..Self::new(message, args)
        }
    }

    /// Attach the file name, keeping any file that is already set.
    pub fn in_file(mut self, file: &str) -> Self {
        if self.file.is_none() {
            self.file = Some(file.to_string());
        }
        self
    }

    /// Whether this is an error diagnostic.
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    /// Whether this diagnostic was built from `message`.
    pub fn is(&self, message: &DiagnosticMessage) -> bool {
        self.code == message.code
    }

    /// Render as `file:line:col: error QL2004: message` using `lines` for positions.
    pub fn render(&self, lines: &LineMap) -> String {
        let mut out = String::new();
        if let Some(ref file) = self.file {
            out.push_str(file);
            out.push(':');
        }
        if let Some(span) = self.span {
            out.push_str(&lines.location_of(span.start).to_string());
            out.push(':');
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!("{} QL{}: {}", self.category, self.code, self.message_text));
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}", file)?;
            if let Some(span) = self.span {
                write!(f, "({})", span.start)?;
            }
            write!(f, ": ")?;
        }
        write!(f, "{} QL{}: {}", self.category, self.code, self.message_text)
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// An ordered collection of diagnostics accumulated during compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Number of diagnostics built from `message`.
    pub fn count_of(&self, message: &DiagnosticMessage) -> usize {
        self.diagnostics.iter().filter(|d| d.is(message)).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn extend_from_slice(&mut self, diagnostics: &[Diagnostic]) {
        self.diagnostics.extend_from_slice(diagnostics);
    }

    /// Drop diagnostics past the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.diagnostics.truncate(len);
    }

    /// Promote every warning to an error.
    pub fn promote_warnings(&mut self) {
        for diagnostic in &mut self.diagnostics {
            diagnostic.category = DiagnosticCategory::Error;
        }
    }
}

impl<'a> IntoIterator for &'a DiagnosticCollection {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Error, message: $msg }
        };
        ($code:expr, Warning, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Warning, message: $msg }
        };
    }

    // ========================================================================
    // Scanner errors (1000-1099)
    // ========================================================================
    pub const INVALID_DECIMAL_POINT: DiagnosticMessage = diag!(1001, Error, "Invalid decimal point: a number can only contain one '.'.");
    pub const NEVER_CLOSED_STRING_LITERAL: DiagnosticMessage = diag!(1002, Error, "Unterminated string literal.");
    pub const INVALID_CHARACTER: DiagnosticMessage = diag!(1003, Error, "Invalid character '{0}'.");
    pub const INVALID_NUMBER: DiagnosticMessage = diag!(1004, Error, "The number '{0}' is not a valid {1}.");
    pub const INVALID_ESCAPE_SEQUENCE: DiagnosticMessage = diag!(1005, Error, "Invalid escape sequence '\\{0}'.");

    // ========================================================================
    // Parser errors (1100-1199)
    // ========================================================================
    pub const EXPECTED_TOKEN: DiagnosticMessage = diag!(1101, Error, "'{0}' expected.");
    pub const UNEXPECTED_TOKEN: DiagnosticMessage = diag!(1102, Error, "Unexpected token '{0}'.");
    pub const NEVER_CLOSED_CURLY_BRACKETS: DiagnosticMessage = diag!(1103, Error, "'{' was never closed.");
    pub const NEVER_CLOSED_PARENTHESIS: DiagnosticMessage = diag!(1104, Error, "'(' was never closed.");

    // ========================================================================
    // Name and type errors (2000-2099)
    // ========================================================================
    pub const UNRESOLVED_IDENTIFIER: DiagnosticMessage = diag!(2001, Error, "Cannot find name '{0}'.");
    pub const INCOMPATIBLE_TYPES: DiagnosticMessage = diag!(2002, Error, "Type '{0}' is not compatible with type '{1}'.");
    pub const UNSUPPORTED_BINARY_OPERATOR: DiagnosticMessage = diag!(2003, Error, "Operator '{0}' cannot be applied to types '{1}' and '{2}'.");
    pub const UNSUPPORTED_UNARY_OPERATOR: DiagnosticMessage = diag!(2004, Error, "Operator '{0}' cannot be applied to type '{1}'.");
    pub const TYPE_NOT_FOUND: DiagnosticMessage = diag!(2005, Error, "Cannot find type '{0}'.");
    pub const MISSING_EXPLICIT_CONVERSION: DiagnosticMessage = diag!(2006, Error, "Type '{0}' cannot be implicitly converted to '{1}'. An explicit conversion exists.");
    pub const CANNOT_CONVERT: DiagnosticMessage = diag!(2007, Error, "Cannot convert type '{0}' to '{1}'.");
    pub const CANNOT_BE_VOID: DiagnosticMessage = diag!(2008, Error, "Expression must have a value.");
    pub const NOT_A_FUNCTION: DiagnosticMessage = diag!(2009, Error, "'{0}' is not a function.");
    pub const ARRAY_CREATION_MUST_HAVE_SIZE: DiagnosticMessage = diag!(2010, Error, "Array creation must specify a size.");
    pub const NOT_A_VARIABLE: DiagnosticMessage = diag!(2011, Error, "'{0}' is not a variable.");

    // ========================================================================
    // Declaration errors (2100-2199)
    // ========================================================================
    pub const VARIABLE_ALREADY_DECLARED: DiagnosticMessage = diag!(2101, Error, "Variable '{0}' is already declared in this scope.");
    pub const FUNCTION_ALREADY_DECLARED: DiagnosticMessage = diag!(2102, Error, "Function '{0}' is already declared.");
    pub const DUPLICATED_PARAMETERS: DiagnosticMessage = diag!(2103, Error, "Duplicate parameter '{0}'.");
    pub const WRONG_AMOUNT_OF_ARGUMENTS: DiagnosticMessage = diag!(2104, Error, "Function '{0}' expects {1} argument(s) but was given {2}.");
    pub const CANNOT_ASSIGN_TO_READ_ONLY: DiagnosticMessage = diag!(2105, Error, "Cannot assign to '{0}' because it is read-only.");
    pub const MAIN_MUST_HAVE_CORRECT_SIGNATURE: DiagnosticMessage = diag!(2106, Error, "'main' must take no parameters and return void.");
    pub const CANNOT_MIX_MAIN_AND_GLOBAL_STATEMENTS: DiagnosticMessage = diag!(2107, Error, "Cannot declare 'main' when the program has global statements.");

    // ========================================================================
    // Control flow errors (2200-2299)
    // ========================================================================
    pub const INVALID_BREAK_OR_CONTINUE: DiagnosticMessage = diag!(2201, Error, "'{0}' can only be used inside a loop.");
    pub const RETURN_ONLY_IN_FUNCTION: DiagnosticMessage = diag!(2202, Error, "'return' can only be used inside a function.");
    pub const ALL_PATHS_MUST_RETURN: DiagnosticMessage = diag!(2203, Error, "Not all code paths return a value.");
    pub const INVALID_RETURN_EXPRESSION: DiagnosticMessage = diag!(2204, Error, "Function '{0}' returns void and cannot return a value.");
    pub const MISSING_RETURN_EXPRESSION: DiagnosticMessage = diag!(2205, Error, "A value of type '{0}' must be returned.");

    // ========================================================================
    // Warnings (6000-6099)
    // ========================================================================
    pub const DIVISION_BY_CONSTANT_ZERO: DiagnosticMessage = diag!(6001, Warning, "Integer division by a constant zero fails at runtime.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_message() {
        let result = format_message("Type '{0}' is not compatible with type '{1}'.", &["int", "string"]);
        assert_eq!(result, "Type 'int' is not compatible with type 'string'.");
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::with_location(
            "test.ql".to_string(),
            TextSpan::new(10, 5),
            &messages::UNRESOLVED_IDENTIFIER,
            &["foo"],
        );
        let display = format!("{}", diag);
        assert!(display.contains("test.ql"));
        assert!(display.contains("QL2001"));
        assert!(display.contains("foo"));
    }

    #[test]
    fn test_diagnostic_render_uses_line_and_column() {
        let text = "var a = 1\nb";
        let diag = Diagnostic::at(TextSpan::new(10, 1), &messages::UNRESOLVED_IDENTIFIER, &["b"])
            .in_file("main.ql");
        assert_eq!(
            diag.render(&LineMap::new(text)),
            "main.ql:2:1: error QL2001: Cannot find name 'b'."
        );
    }

    #[test]
    fn test_diagnostic_without_location() {
        let diag = Diagnostic::new(&messages::RETURN_ONLY_IN_FUNCTION, &[]);
        assert!(diag.file.is_none());
        assert!(diag.span.is_none());
        assert_eq!(diag.code, 2202);
        assert!(diag.is_error());
        assert!(diag.is(&messages::RETURN_ONLY_IN_FUNCTION));
    }

    #[test]
    fn test_diagnostic_collection() {
        let mut collection = DiagnosticCollection::new();
        assert!(collection.is_empty());

        collection.add(Diagnostic::new(&messages::DIVISION_BY_CONSTANT_ZERO, &[]));
        assert!(!collection.has_errors());
        collection.add(Diagnostic::new(&messages::CANNOT_BE_VOID, &[]));
        assert!(collection.has_errors());
        assert_eq!(collection.error_count(), 1);
        assert_eq!(collection.count_of(&messages::CANNOT_BE_VOID), 1);
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_promote_warnings() {
        let mut collection = DiagnosticCollection::new();
        collection.add(Diagnostic::new(&messages::DIVISION_BY_CONSTANT_ZERO, &[]));
        collection.promote_warnings();
        assert!(collection.has_errors());
    }
}
