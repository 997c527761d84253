//! Parser utility functions.

use quill_diagnostics::{messages, DiagnosticCollection};
use quill_syntax::SyntaxKind;

/// Check if a token kind can start an expression.
pub fn can_start_expression(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Identifier
            | SyntaxKind::IntegerLiteral
            | SyntaxKind::FloatLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::TrueKeyword
            | SyntaxKind::FalseKeyword
            | SyntaxKind::NewKeyword
            | SyntaxKind::OpenParenToken
            | SyntaxKind::PlusToken
            | SyntaxKind::MinusToken
            | SyntaxKind::ExclamationToken
            | SyntaxKind::TildeToken
    )
}

/// Whether parse diagnostics show the input stopped inside an unclosed
/// block or parenthesis, so more lines could complete it. Strings end at
/// a line break and never continue.
pub fn is_incomplete_submission(diagnostics: &DiagnosticCollection) -> bool {
    diagnostics.iter().any(|d| {
        d.is(&messages::NEVER_CLOSED_CURLY_BRACKETS)
            || d.is(&messages::NEVER_CLOSED_PARENTHESIS)
    })
}
