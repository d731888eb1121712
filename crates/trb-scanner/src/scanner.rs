//! The scanner implementation.
//!
//! Scanning is eager: [`tokenize`] walks the whole source once and returns
//! every token plus any lexical diagnostics. The parser then works over the
//! token vector with cheap bounded lookahead.

use crate::{SyntaxKind, Token, keyword_kind};
use trb_common::diagnostics::{Diagnostic, DiagnosticCategory, codes};
use trb_common::{Span, SpanBuilder};

/// Result of scanning one source file.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Scan `source` into a token stream.
pub fn tokenize(source: &str) -> ScanResult {
    let mut scanner = Scanner::new(source);
    scanner.run();
    ScanResult {
        tokens: scanner.tokens,
        diagnostics: scanner.diagnostics,
    }
}

/// An open `#{` interpolation; `brace_depth` tracks nested `{` inside it.
struct InterpolationFrame {
    brace_depth: u32,
}

/// Streaming scanner state over one source buffer.
pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
    frames: Vec<InterpolationFrame>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
            frames: Vec::new(),
        }
    }

    fn run(&mut self) {
        while self.pos < self.bytes.len() {
            self.scan_token();
        }
        if !self.frames.is_empty() {
            self.diagnostics.push(Diagnostic::error(
                DiagnosticCategory::Parse,
                codes::UNTERMINATED_INTERPOLATION,
                Span::at(self.pos as u32),
                "unterminated string interpolation",
            ));
        }
        self.push(SyntaxKind::EndOfFile, Span::at(self.pos as u32));
    }

    fn push(&mut self, kind: SyntaxKind, span: Span) {
        self.tokens.push(Token::new(kind, span));
    }

    fn peek(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn scan_token(&mut self) {
        let start = SpanBuilder::start(self.pos as u32);
        let byte = self.bytes[self.pos];

        match byte {
            b' ' | b'\t' | b'\r' => {
                self.pos += 1;
            }
            b'\\' if self.peek(1) == b'\n' => {
                // Line continuation: swallow the backslash and the newline.
                self.pos += 2;
            }
            b'\n' => {
                self.pos += 1;
                self.push(SyntaxKind::Newline, start.end(self.pos as u32));
            }
            b'#' => {
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
                self.push(SyntaxKind::Comment, start.end(self.pos as u32));
            }
            b'"' => {
                self.pos += 1;
                self.scan_double_quoted(self.pos - 1, false);
            }
            b'\'' => self.scan_single_quoted(),
            b'0'..=b'9' => self.scan_number(),
            b'@' => self.scan_at_variable(),
            b'$' => self.scan_global_variable(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(),
            b':' => {
                if self.peek(1) == b':' {
                    self.pos += 2;
                    self.push(SyntaxKind::ColonColonToken, start.end(self.pos as u32));
                } else if is_identifier_start(self.peek(1)) {
                    // `:name` symbol literal
                    self.pos += 1;
                    while is_identifier_continue(self.peek(0)) {
                        self.pos += 1;
                    }
                    if matches!(self.peek(0), b'?' | b'!') {
                        self.pos += 1;
                    }
                    self.push(SyntaxKind::SymbolLiteral, start.end(self.pos as u32));
                } else {
                    self.pos += 1;
                    self.push(SyntaxKind::ColonToken, start.end(self.pos as u32));
                }
            }
            b'{' => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.brace_depth += 1;
                }
                self.pos += 1;
                self.push(SyntaxKind::LeftBraceToken, start.end(self.pos as u32));
            }
            b'}' => {
                self.pos += 1;
                match self.frames.last_mut() {
                    Some(frame) if frame.brace_depth == 0 => {
                        self.frames.pop();
                        self.push(SyntaxKind::InterpolationEnd, start.end(self.pos as u32));
                        // Resume the enclosing string literal.
                        let resume_at = self.pos;
                        self.scan_double_quoted(resume_at, true);
                    }
                    Some(frame) => {
                        frame.brace_depth -= 1;
                        self.push(SyntaxKind::RightBraceToken, start.end(self.pos as u32));
                    }
                    None => {
                        self.push(SyntaxKind::RightBraceToken, start.end(self.pos as u32));
                    }
                }
            }
            _ => self.scan_operator(),
        }
    }

    /// Scan a double-quoted string body beginning at `start` (the opening
    /// quote when `continued` is false, the first byte after `#{...}`
    /// otherwise). Emits fragments and interpolation markers.
    fn scan_double_quoted(&mut self, start: usize, continued: bool) {
        let interpolated = continued;
        loop {
            match self.peek(0) {
                0 if self.pos >= self.bytes.len() => {
                    self.diagnostics.push(Diagnostic::error(
                        DiagnosticCategory::Parse,
                        codes::UNTERMINATED_STRING,
                        Span::new(start as u32, self.pos as u32),
                        "unterminated string literal",
                    ));
                    let kind = if interpolated {
                        SyntaxKind::StringFragment
                    } else {
                        SyntaxKind::StringLiteral
                    };
                    self.push(kind, Span::new(start as u32, self.pos as u32));
                    return;
                }
                b'\\' => {
                    // Escape sequence: skip the escaped byte blindly.
                    self.pos += 2;
                }
                b'#' if self.peek(1) == b'{' => {
                    self.push(
                        SyntaxKind::StringFragment,
                        Span::new(start as u32, self.pos as u32),
                    );
                    let marker = SpanBuilder::start(self.pos as u32);
                    self.pos += 2;
                    self.push(SyntaxKind::InterpolationStart, marker.end(self.pos as u32));
                    self.frames.push(InterpolationFrame { brace_depth: 0 });
                    return;
                }
                b'"' => {
                    self.pos += 1;
                    let kind = if interpolated {
                        SyntaxKind::StringFragment
                    } else {
                        SyntaxKind::StringLiteral
                    };
                    self.push(kind, Span::new(start as u32, self.pos as u32));
                    return;
                }
                _ => {
                    self.pos += 1;
                }
            }
        }
    }

    fn scan_single_quoted(&mut self) {
        let start = SpanBuilder::start(self.pos as u32);
        self.pos += 1;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\'' {
            if self.bytes[self.pos] == b'\\' {
                self.pos += 1;
            }
            self.pos += 1;
        }
        if self.pos >= self.bytes.len() {
            self.diagnostics.push(Diagnostic::error(
                DiagnosticCategory::Parse,
                codes::UNTERMINATED_STRING,
                start.end(self.pos as u32),
                "unterminated string literal",
            ));
        } else {
            self.pos += 1;
        }
        self.push(SyntaxKind::StringLiteral, start.end(self.pos as u32));
    }

    fn scan_number(&mut self) {
        let start = SpanBuilder::start(self.pos as u32);
        let mut kind = SyntaxKind::IntegerLiteral;
        self.consume_digits();
        if self.peek(0) == b'.' && self.peek(1).is_ascii_digit() {
            kind = SyntaxKind::FloatLiteral;
            self.pos += 1;
            self.consume_digits();
        }
        if matches!(self.peek(0), b'e' | b'E') {
            let mut ahead = 1;
            if matches!(self.peek(1), b'+' | b'-') {
                ahead = 2;
            }
            if self.peek(ahead).is_ascii_digit() {
                kind = SyntaxKind::FloatLiteral;
                self.pos += ahead;
                self.consume_digits();
            }
        }
        self.push(kind, start.end(self.pos as u32));
    }

    fn consume_digits(&mut self) {
        while self.peek(0).is_ascii_digit() || (self.peek(0) == b'_' && self.peek(1).is_ascii_digit())
        {
            self.pos += 1;
        }
    }

    fn scan_at_variable(&mut self) {
        let start = SpanBuilder::start(self.pos as u32);
        let kind = if self.peek(1) == b'@' {
            self.pos += 2;
            SyntaxKind::ClassVariable
        } else {
            self.pos += 1;
            SyntaxKind::InstanceVariable
        };
        while is_identifier_continue(self.peek(0)) {
            self.pos += 1;
        }
        self.push(kind, start.end(self.pos as u32));
    }

    fn scan_global_variable(&mut self) {
        let start = SpanBuilder::start(self.pos as u32);
        self.pos += 1;
        while is_identifier_continue(self.peek(0)) {
            self.pos += 1;
        }
        self.push(SyntaxKind::GlobalVariable, start.end(self.pos as u32));
    }

    fn scan_identifier(&mut self) {
        let start = SpanBuilder::start(self.pos as u32);
        let first = self.bytes[self.pos];
        while is_identifier_continue(self.peek(0)) {
            self.pos += 1;
        }
        // Ruby method names may end in `?` or `!`. Constants never do, so an
        // `Integer?` stays two tokens and the optional-type suffix parses.
        if !first.is_ascii_uppercase() && matches!(self.peek(0), b'?' | b'!') {
            self.pos += 1;
        }
        let span = start.end(self.pos as u32);
        let text = span.slice(self.source);
        let kind = keyword_kind(text).unwrap_or(if first.is_ascii_uppercase() {
            SyntaxKind::ConstantName
        } else {
            SyntaxKind::Identifier
        });
        self.push(kind, span);
    }

    fn scan_operator(&mut self) {
        let start = SpanBuilder::start(self.pos as u32);
        let (kind, len) = match (self.peek(0), self.peek(1), self.peek(2)) {
            (b'<', b'=', b'>') => (SyntaxKind::SpaceshipToken, 3),
            (b'&', b'&', b'=') => (SyntaxKind::AmpersandAmpersandEqualsToken, 3),
            (b'|', b'|', b'=') => (SyntaxKind::BarBarEqualsToken, 3),
            (b'.', b'.', b'.') => (SyntaxKind::DotDotDotToken, 3),
            (b'<', b'=', _) => (SyntaxKind::LessThanEqualsToken, 2),
            (b'<', b'<', _) => (SyntaxKind::LessThanLessThanToken, 2),
            (b'>', b'=', _) => (SyntaxKind::GreaterThanEqualsToken, 2),
            (b'>', b'>', _) => (SyntaxKind::GreaterThanGreaterThanToken, 2),
            (b'=', b'=', _) => (SyntaxKind::EqualsEqualsToken, 2),
            (b'=', b'>', _) => (SyntaxKind::FatArrowToken, 2),
            (b'!', b'=', _) => (SyntaxKind::BangEqualsToken, 2),
            (b'&', b'&', _) => (SyntaxKind::AmpersandAmpersandToken, 2),
            (b'&', b'.', _) => (SyntaxKind::SafeNavigationToken, 2),
            (b'|', b'|', _) => (SyntaxKind::BarBarToken, 2),
            (b'*', b'*', _) => (SyntaxKind::StarStarToken, 2),
            (b'+', b'=', _) => (SyntaxKind::PlusEqualsToken, 2),
            (b'-', b'=', _) => (SyntaxKind::MinusEqualsToken, 2),
            (b'-', b'>', _) => (SyntaxKind::ArrowToken, 2),
            (b'*', b'=', _) => (SyntaxKind::StarEqualsToken, 2),
            (b'/', b'=', _) => (SyntaxKind::SlashEqualsToken, 2),
            (b'%', b'=', _) => (SyntaxKind::PercentEqualsToken, 2),
            (b'.', b'.', _) => (SyntaxKind::DotDotToken, 2),
            (b'+', _, _) => (SyntaxKind::PlusToken, 1),
            (b'-', _, _) => (SyntaxKind::MinusToken, 1),
            (b'*', _, _) => (SyntaxKind::StarToken, 1),
            (b'/', _, _) => (SyntaxKind::SlashToken, 1),
            (b'%', _, _) => (SyntaxKind::PercentToken, 1),
            (b'=', _, _) => (SyntaxKind::EqualsToken, 1),
            (b'<', _, _) => (SyntaxKind::LessThanToken, 1),
            (b'>', _, _) => (SyntaxKind::GreaterThanToken, 1),
            (b'!', _, _) => (SyntaxKind::BangToken, 1),
            (b'&', _, _) => (SyntaxKind::AmpersandToken, 1),
            (b'|', _, _) => (SyntaxKind::BarToken, 1),
            (b'^', _, _) => (SyntaxKind::CaretToken, 1),
            (b'(', _, _) => (SyntaxKind::LeftParenToken, 1),
            (b')', _, _) => (SyntaxKind::RightParenToken, 1),
            (b'[', _, _) => (SyntaxKind::LeftBracketToken, 1),
            (b']', _, _) => (SyntaxKind::RightBracketToken, 1),
            (b',', _, _) => (SyntaxKind::CommaToken, 1),
            (b'.', _, _) => (SyntaxKind::DotToken, 1),
            (b';', _, _) => (SyntaxKind::SemicolonToken, 1),
            (b'?', _, _) => (SyntaxKind::QuestionToken, 1),
            _ => (SyntaxKind::Unknown, 1),
        };
        // Unknown bytes may be multi-byte UTF-8; consume the whole character.
        if kind == SyntaxKind::Unknown {
            let ch_len = self.source[self.pos..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            self.pos += ch_len;
        } else {
            self.pos += len;
        }
        self.push(kind, start.end(self.pos as u32));
    }
}

fn is_identifier_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_identifier_continue(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}
