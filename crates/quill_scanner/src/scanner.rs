//! The quill scanner/lexer.
//!
//! Converts source text into a stream of tokens that the parser consumes.
//! Positions are byte offsets into the source text.

use crate::char_codes::*;
use crate::token::TokenInfo;
use quill_core::text::{TextPos, TextSpan};
use quill_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};
use quill_syntax::{SyntaxKind, TokenFlags};

/// Saved scanner state for lookahead.
pub struct ScannerState {
    pub pos: usize,
    pub token_start: usize,
    pub token: SyntaxKind,
    pub token_value: String,
    pub token_flags: TokenFlags,
    pub diagnostic_count: usize,
}

/// The scanner converts quill source text into tokens.
pub struct Scanner {
    /// The source text being scanned.
    text: String,
    /// Current byte position in the text.
    pos: usize,
    /// Start of the current token (after leading trivia).
    token_start: usize,
    /// The current token kind.
    token: SyntaxKind,
    /// The decoded value of the current token.
    token_value: String,
    /// Token flags for the current token.
    token_flags: TokenFlags,
    /// Accumulated diagnostics.
    diagnostics: DiagnosticCollection,
}

impl Scanner {
    /// Create a new scanner for the given source text.
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            pos: 0,
            token_start: 0,
            token: SyntaxKind::Unknown,
            token_value: String::new(),
            token_flags: TokenFlags::NONE,
            diagnostics: DiagnosticCollection::new(),
        }
    }

    /// Scan every token of `text`, including the final end-of-file token.
    pub fn tokenize(text: &str) -> (Vec<TokenInfo>, DiagnosticCollection) {
        let mut scanner = Scanner::new(text);
        let mut tokens = Vec::new();
        loop {
            let kind = scanner.scan();
            tokens.push(scanner.token_info());
            if kind == SyntaxKind::EndOfFileToken {
                break;
            }
        }
        (tokens, scanner.take_diagnostics())
    }

    /// Run `f` and rewind to the current token afterwards.
    pub fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let state = self.save_state();
        let result = f(self);
        self.restore_state(state);
        result
    }

    /// The current token kind.
    #[inline]
    pub fn token(&self) -> SyntaxKind {
        self.token
    }

    /// The decoded value of the current token.
    #[inline]
    pub fn token_value(&self) -> &str {
        &self.token_value
    }

    /// Start position of the current token.
    #[inline]
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// End position of the current token.
    #[inline]
    pub fn token_end(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn token_flags(&self) -> TokenFlags {
        self.token_flags
    }

    #[inline]
    pub fn has_preceding_line_break(&self) -> bool {
        self.token_flags.contains(TokenFlags::PRECEDING_LINE_BREAK)
    }

    /// Get the accumulated diagnostics.
    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }

    /// Take the accumulated diagnostics, leaving an empty collection.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    /// Snapshot of the current token.
    pub fn token_info(&self) -> TokenInfo {
        TokenInfo::new(self.token, self.token_start as TextPos, self.pos as TextPos)
            .with_text(self.token_value.clone())
            .with_flags(self.token_flags)
    }

    pub fn save_state(&self) -> ScannerState {
        ScannerState {
            pos: self.pos,
            token_start: self.token_start,
            token: self.token,
            token_value: self.token_value.clone(),
            token_flags: self.token_flags,
            diagnostic_count: self.diagnostics.len(),
        }
    }

    /// Restore a saved state, dropping diagnostics reported since it was taken.
    pub fn restore_state(&mut self, state: ScannerState) {
        self.pos = state.pos;
        self.token_start = state.token_start;
        self.token = state.token;
        self.token_value = state.token_value;
        self.token_flags = state.token_flags;
        self.diagnostics.truncate(state.diagnostic_count);
    }

    /// The full source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    // ========================================================================
    // Core scanning
    // ========================================================================

    #[inline]
    fn current_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    /// Look at the character `offset` characters past the current one.
    #[inline]
    fn char_at(&self, offset: usize) -> Option<char> {
        self.text[self.pos..].chars().nth(offset)
    }

    #[inline]
    fn advance(&mut self, ch: char) {
        self.pos += ch.len_utf8();
    }

    fn error(&mut self, start: usize, end: usize, message: &DiagnosticMessage, args: &[&str]) {
        let span = TextSpan::from_bounds(start as TextPos, end as TextPos);
        self.diagnostics.add(Diagnostic::at(span, message, args));
    }

    /// Skip whitespace and comments, setting token_flags for line breaks.
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.current_char() {
            if is_line_break(ch) {
                self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
                self.advance(ch);
            } else if is_white_space_single_line(ch) {
                self.advance(ch);
            } else if ch == '#' {
                // Comment to end of line
                while let Some(c) = self.current_char() {
                    if is_line_break(c) {
                        break;
                    }
                    self.advance(c);
                }
            } else {
                return;
            }
        }
    }

    /// Scan the next token and return its kind.
    pub fn scan(&mut self) -> SyntaxKind {
        self.token_flags = TokenFlags::NONE;
        self.token_value.clear();

        self.skip_trivia();
        self.token_start = self.pos;

        let Some(ch) = self.current_char() else {
            self.token = SyntaxKind::EndOfFileToken;
            return self.token;
        };

        self.token = match ch {
            '(' => self.single(SyntaxKind::OpenParenToken),
            ')' => self.single(SyntaxKind::CloseParenToken),
            '{' => self.single(SyntaxKind::OpenBraceToken),
            '}' => self.single(SyntaxKind::CloseBraceToken),
            '[' => self.single(SyntaxKind::OpenBracketToken),
            ']' => self.single(SyntaxKind::CloseBracketToken),
            ',' => self.single(SyntaxKind::CommaToken),
            ':' => self.single(SyntaxKind::ColonToken),
            '?' => self.single(SyntaxKind::QuestionToken),
            '~' => self.single(SyntaxKind::TildeToken),

            '+' => self.scan_plus(),
            '-' => self.scan_minus(),
            '*' => self.scan_asterisk(),
            '/' => self.scan_slash(),
            '%' => self.with_equals(SyntaxKind::PercentToken, SyntaxKind::PercentEqualsToken),
            '^' => self.with_equals(SyntaxKind::CaretToken, SyntaxKind::CaretEqualsToken),
            '&' => self.scan_doubled(
                '&',
                SyntaxKind::AmpersandToken,
                SyntaxKind::AmpersandAmpersandToken,
                SyntaxKind::AmpersandEqualsToken,
            ),
            '|' => self.scan_doubled(
                '|',
                SyntaxKind::BarToken,
                SyntaxKind::BarBarToken,
                SyntaxKind::BarEqualsToken,
            ),
            '=' => self.with_equals(SyntaxKind::EqualsToken, SyntaxKind::EqualsEqualsToken),
            '!' => self.with_equals(SyntaxKind::ExclamationToken, SyntaxKind::ExclamationEqualsToken),
            '<' => self.with_equals(SyntaxKind::LessThanToken, SyntaxKind::LessThanEqualsToken),
            '>' => self.with_equals(SyntaxKind::GreaterThanToken, SyntaxKind::GreaterThanEqualsToken),

            '"' => self.scan_string_literal(),

            c if is_digit(c) => self.scan_number(),
            c if is_identifier_start(c) => self.scan_identifier(),

            c => {
                self.advance(c);
                let text = c.to_string();
                self.error(self.token_start, self.pos, &messages::INVALID_CHARACTER, &[&text]);
                self.token_value = text;
                SyntaxKind::Unknown
            }
        };

        self.token
    }

    // ========================================================================
    // Token-specific scanning methods
    // ========================================================================

    fn single(&mut self, kind: SyntaxKind) -> SyntaxKind {
        self.pos += 1;
        kind
    }

    /// `c` or `c=`.
    fn with_equals(&mut self, plain: SyntaxKind, equals: SyntaxKind) -> SyntaxKind {
        if self.char_at(1) == Some('=') {
            self.pos += 2;
            equals
        } else {
            self.pos += 1;
            plain
        }
    }

    /// `c`, `cc`, or `c=`.
    fn scan_doubled(
        &mut self,
        ch: char,
        plain: SyntaxKind,
        doubled: SyntaxKind,
        equals: SyntaxKind,
    ) -> SyntaxKind {
        match self.char_at(1) {
            Some(next) if next == ch => {
                self.pos += 2;
                doubled
            }
            Some('=') => {
                self.pos += 2;
                equals
            }
            _ => {
                self.pos += 1;
                plain
            }
        }
    }

    fn scan_plus(&mut self) -> SyntaxKind {
        self.scan_doubled(
            '+',
            SyntaxKind::PlusToken,
            SyntaxKind::PlusPlusToken,
            SyntaxKind::PlusEqualsToken,
        )
    }

    fn scan_minus(&mut self) -> SyntaxKind {
        self.scan_doubled(
            '-',
            SyntaxKind::MinusToken,
            SyntaxKind::MinusMinusToken,
            SyntaxKind::MinusEqualsToken,
        )
    }

    fn scan_asterisk(&mut self) -> SyntaxKind {
        match self.char_at(1) {
            Some('*') => {
                self.pos += 2;
                SyntaxKind::AsteriskAsteriskToken
            }
            Some('=') => {
                self.pos += 2;
                SyntaxKind::AsteriskEqualsToken
            }
            _ => {
                self.pos += 1;
                SyntaxKind::AsteriskToken
            }
        }
    }

    fn scan_slash(&mut self) -> SyntaxKind {
        match self.char_at(1) {
            Some('/') => {
                self.pos += 2;
                SyntaxKind::SlashSlashToken
            }
            Some('=') => {
                self.pos += 2;
                SyntaxKind::SlashEqualsToken
            }
            _ => {
                self.pos += 1;
                SyntaxKind::SlashToken
            }
        }
    }

    /// Scan an integer or float literal. The token value is the literal text,
    /// cut at a second decimal point, which is reported and skipped.
    fn scan_number(&mut self) -> SyntaxKind {
        let start = self.pos;
        let mut seen_dot = false;
        let mut valid_end = None;

        while let Some(ch) = self.current_char() {
            if is_digit(ch) {
                self.pos += 1;
            } else if ch == '.' && self.char_at(1).map_or(false, is_digit) {
                if seen_dot {
                    if valid_end.is_none() {
                        valid_end = Some(self.pos);
                        self.error(self.pos, self.pos + 1, &messages::INVALID_DECIMAL_POINT, &[]);
                    }
                } else {
                    seen_dot = true;
                }
                self.pos += 1;
            } else {
                break;
            }
        }

        let end = valid_end.unwrap_or(self.pos);
        self.token_value = self.text[start..end].to_string();
        if seen_dot {
            SyntaxKind::FloatLiteral
        } else {
            SyntaxKind::IntegerLiteral
        }
    }

    fn scan_identifier(&mut self) -> SyntaxKind {
        let start = self.pos;
        while let Some(ch) = self.current_char() {
            if !is_identifier_part(ch) {
                break;
            }
            self.advance(ch);
        }
        self.token_value = self.text[start..self.pos].to_string();
        SyntaxKind::from_keyword(&self.token_value).unwrap_or(SyntaxKind::Identifier)
    }

    /// Scan a double-quoted string. The token value is the decoded contents.
    fn scan_string_literal(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();

        loop {
            let Some(ch) = self.current_char() else {
                self.token_flags |= TokenFlags::UNTERMINATED;
                self.error(start, self.pos, &messages::NEVER_CLOSED_STRING_LITERAL, &[]);
                break;
            };
            match ch {
                '"' => {
                    self.pos += 1;
                    break;
                }
                '\\' => {
                    let escape_start = self.pos;
                    self.pos += 1;
                    match self.current_char() {
                        Some('"') => value.push('"'),
                        Some('\\') => value.push('\\'),
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some(other) if !is_line_break(other) => {
                            let text = other.to_string();
                            self.error(
                                escape_start,
                                self.pos + other.len_utf8(),
                                &messages::INVALID_ESCAPE_SEQUENCE,
                                &[&text],
                            );
                            value.push(other);
                        }
                        // A backslash before a line break or at the end of input
                        // leaves the string open; the next iteration reports it.
                        _ => continue,
                    }
                    if let Some(escaped) = self.current_char() {
                        self.advance(escaped);
                    }
                }
                c if is_line_break(c) => {
                    self.token_flags |= TokenFlags::UNTERMINATED;
                    self.error(start, self.pos, &messages::NEVER_CLOSED_STRING_LITERAL, &[]);
                    break;
                }
                c => {
                    value.push(c);
                    self.advance(c);
                }
            }
        }

        self.token_value = value;
        SyntaxKind::StringLiteral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<SyntaxKind> {
        let (tokens, _) = Scanner::tokenize(text);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("+ ++ += ** // /= && &= || == != <= >= !"),
            vec![
                SyntaxKind::PlusToken,
                SyntaxKind::PlusPlusToken,
                SyntaxKind::PlusEqualsToken,
                SyntaxKind::AsteriskAsteriskToken,
                SyntaxKind::SlashSlashToken,
                SyntaxKind::SlashEqualsToken,
                SyntaxKind::AmpersandAmpersandToken,
                SyntaxKind::AmpersandEqualsToken,
                SyntaxKind::BarBarToken,
                SyntaxKind::EqualsEqualsToken,
                SyntaxKind::ExclamationEqualsToken,
                SyntaxKind::LessThanEqualsToken,
                SyntaxKind::GreaterThanEqualsToken,
                SyntaxKind::ExclamationToken,
                SyntaxKind::EndOfFileToken,
            ]
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let (tokens, diagnostics) = Scanner::tokenize("fn let x_1 wéird");
        assert!(diagnostics.is_empty());
        assert_eq!(tokens[0].kind, SyntaxKind::FnKeyword);
        assert_eq!(tokens[1].kind, SyntaxKind::LetKeyword);
        assert_eq!(tokens[2].kind, SyntaxKind::Identifier);
        assert_eq!(tokens[2].text, "x_1");
        assert_eq!(tokens[3].text, "wéird");
        assert_eq!(tokens[3].end as usize, "fn let x_1 wéird".len());
    }

    #[test]
    fn test_numbers() {
        let (tokens, diagnostics) = Scanner::tokenize("42 3.25");
        assert!(diagnostics.is_empty());
        assert_eq!(tokens[0].kind, SyntaxKind::IntegerLiteral);
        assert_eq!(tokens[0].text, "42");
        assert_eq!(tokens[1].kind, SyntaxKind::FloatLiteral);
        assert_eq!(tokens[1].text, "3.25");
    }

    #[test]
    fn test_second_decimal_point() {
        let (tokens, diagnostics) = Scanner::tokenize("1.2.3");
        assert_eq!(diagnostics.count_of(&messages::INVALID_DECIMAL_POINT), 1);
        assert_eq!(tokens[0].kind, SyntaxKind::FloatLiteral);
        assert_eq!(tokens[0].text, "1.2");
        assert_eq!(tokens[0].end, 5);
        assert_eq!(tokens[1].kind, SyntaxKind::EndOfFileToken);
    }

    #[test]
    fn test_string_escapes() {
        let (tokens, diagnostics) = Scanner::tokenize(r#""a\"b\\c\nd\te""#);
        assert!(diagnostics.is_empty());
        assert_eq!(tokens[0].kind, SyntaxKind::StringLiteral);
        assert_eq!(tokens[0].text, "a\"b\\c\nd\te");
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, diagnostics) = Scanner::tokenize("\"abc\nx");
        assert_eq!(diagnostics.count_of(&messages::NEVER_CLOSED_STRING_LITERAL), 1);
        assert!(tokens[0].flags.contains(TokenFlags::UNTERMINATED));
        assert_eq!(tokens[0].text, "abc");
        assert_eq!(tokens[1].kind, SyntaxKind::Identifier);
        assert!(tokens[1].has_preceding_line_break());
    }

    #[test]
    fn test_invalid_escape_sequence() {
        let (tokens, diagnostics) = Scanner::tokenize(r#""a\qb""#);
        assert_eq!(diagnostics.count_of(&messages::INVALID_ESCAPE_SEQUENCE), 1);
        assert_eq!(tokens[0].text, "aqb");
    }

    #[test]
    fn test_comments_and_line_breaks() {
        let (tokens, _) = Scanner::tokenize("a # comment + b\nc");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "a");
        assert!(!tokens[0].has_preceding_line_break());
        assert_eq!(tokens[1].text, "c");
        assert!(tokens[1].has_preceding_line_break());
    }

    #[test]
    fn test_invalid_character() {
        let (tokens, diagnostics) = Scanner::tokenize("a @ b");
        assert_eq!(diagnostics.count_of(&messages::INVALID_CHARACTER), 1);
        assert_eq!(tokens[1].kind, SyntaxKind::Unknown);
        assert_eq!(diagnostics.diagnostics()[0].span, Some(TextSpan::new(2, 1)));
    }

    #[test]
    fn test_look_ahead_restores_state() {
        let mut scanner = Scanner::new("x = 1");
        scanner.scan();
        let next = scanner.look_ahead(|s| s.scan());
        assert_eq!(next, SyntaxKind::EqualsToken);
        assert_eq!(scanner.token(), SyntaxKind::Identifier);
        assert_eq!(scanner.token_value(), "x");
    }
}
