//! Recursive-descent parser over the scanner's token stream.
//!
//! The parser is split by concern, mirroring the grammar:
//! - `types`: type expressions (precedence climbing)
//! - `declarations`: `def` / `class` / `module` / `interface` / `type` / constants
//! - `expressions`: method bodies
//!
//! Errors are collected as diagnostics, never thrown. At declaration level
//! the parser recovers by skipping to the next line; inside bodies, syntax
//! it does not understand becomes an opaque `Raw` node that the emitter
//! passes through verbatim.

mod declarations;
mod expressions;
mod types;

use crate::ir::{NodeId, Program};
use trb_common::Span;
use trb_common::diagnostics::{Diagnostic, DiagnosticCategory, codes};
use trb_scanner::{SyntaxKind, Token, tokenize};

/// Result of parsing one source file.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    /// Whether any parse diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Parse a source file into a [`Program`].
pub fn parse_program(source: &str) -> ParseResult {
    parse_with_mode(source, false)
}

/// Parse a `.d.trb` declaration file: same grammar, but methods have no
/// bodies (a `def` line stands alone, with no matching `end`).
pub fn parse_declaration_program(source: &str) -> ParseResult {
    parse_with_mode(source, true)
}

fn parse_with_mode(source: &str, declaration_mode: bool) -> ParseResult {
    let scanned = tokenize(source);
    let mut state = ParserState::new(source, scanned.tokens);
    state.declaration_mode = declaration_mode;
    state.diagnostics = scanned.diagnostics;
    let program = state.parse_program();
    tracing::debug!(
        declarations = program.declarations.len(),
        diagnostics = state.diagnostics.len(),
        "parsed program"
    );
    ParseResult {
        program,
        diagnostics: state.diagnostics,
    }
}

/// Shared parser state: token cursor, node-id allocator, diagnostics.
pub(crate) struct ParserState<'a> {
    pub(crate) source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    pub(crate) diagnostics: Vec<Diagnostic>,
    next_id: u32,
    /// End offset of the first half of a split `>>` token (see
    /// [`ParserState::eat_type_list_close`]); cleared on the next `bump`.
    virtual_prev_end: Option<u32>,
    /// Generic-parameter names currently in scope, innermost last.
    /// Pushed when entering a `def`/`class`/`interface`/`type` declaration
    /// with generics, truncated on the way out.
    pub(crate) type_vars: Vec<String>,
    /// `.d.trb` input: methods are bodyless signatures.
    pub(crate) declaration_mode: bool,
}

impl<'a> ParserState<'a> {
    fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        // Comments are trivia to the parser; the emitters re-read them from
        // the source text, so dropping them here loses nothing.
        let tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|t| !t.kind.is_trivia())
            .collect();
        ParserState {
            source,
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
            next_id: 0,
            virtual_prev_end: None,
            type_vars: Vec::new(),
            declaration_mode: false,
        }
    }

    // ==================== Cursor ====================

    pub(crate) fn current(&self) -> Token {
        self.tokens
            .get(self.pos)
            .copied()
            .unwrap_or_else(|| Token::new(SyntaxKind::EndOfFile, Span::at(self.source.len() as u32)))
    }

    pub(crate) fn kind(&self) -> SyntaxKind {
        self.current().kind
    }

    /// Kind of the token `n` positions ahead (0 = current).
    pub(crate) fn nth_kind(&self, n: usize) -> SyntaxKind {
        self.tokens
            .get(self.pos + n)
            .map_or(SyntaxKind::EndOfFile, |t| t.kind)
    }

    /// Token `n` positions ahead (0 = current).
    pub(crate) fn nth_token(&self, n: usize) -> Token {
        self.tokens
            .get(self.pos + n)
            .copied()
            .unwrap_or_else(|| Token::new(SyntaxKind::EndOfFile, Span::at(self.source.len() as u32)))
    }

    pub(crate) fn bump(&mut self) -> Token {
        let token = self.current();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        self.virtual_prev_end = None;
        token
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.kind() == kind
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.at(SyntaxKind::EndOfFile)
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> Option<Token> {
        if self.at(kind) { Some(self.bump()) } else { None }
    }

    /// Consume `kind` or report an unexpected-token diagnostic.
    pub(crate) fn expect(&mut self, kind: SyntaxKind, what: &str) -> Option<Token> {
        if let Some(token) = self.eat(kind) {
            return Some(token);
        }
        let current = self.current();
        self.error(
            codes::UNEXPECTED_TOKEN,
            current.span,
            format!("expected {what}, found `{}`", describe_token(current, self.source)),
        );
        None
    }

    /// Skip newlines and semicolons (statement separators).
    pub(crate) fn skip_separators(&mut self) {
        while matches!(
            self.kind(),
            SyntaxKind::Newline | SyntaxKind::SemicolonToken
        ) {
            self.bump();
        }
    }

    /// Whether the current token ends a statement line.
    pub(crate) fn at_line_end(&self) -> bool {
        matches!(
            self.kind(),
            SyntaxKind::Newline | SyntaxKind::SemicolonToken | SyntaxKind::EndOfFile
        )
    }

    /// Skip everything up to and including the next line break.
    /// Declaration-level error recovery.
    pub(crate) fn recover_to_line_end(&mut self) {
        while !self.at_line_end() {
            self.bump();
        }
        self.skip_separators();
    }

    /// Split a `>>` token into two `>` tokens so nested generic lists like
    /// `Hash<String, Array<T>>` close correctly. Consumes one `>`.
    pub(crate) fn eat_type_list_close(&mut self) -> bool {
        match self.kind() {
            SyntaxKind::GreaterThanToken => {
                self.bump();
                true
            }
            SyntaxKind::GreaterThanGreaterThanToken => {
                let span = self.current().span;
                self.tokens[self.pos] = Token::new(
                    SyntaxKind::GreaterThanToken,
                    Span::new(span.start + 1, span.end),
                );
                self.virtual_prev_end = Some(span.start + 1);
                true
            }
            _ => false,
        }
    }

    /// End offset of the most recently consumed token (or the first half
    /// of a just-split `>>`).
    pub(crate) fn previous_end(&self) -> u32 {
        if let Some(end) = self.virtual_prev_end {
            return end;
        }
        if self.pos == 0 {
            return 0;
        }
        self.tokens.get(self.pos - 1).map_or(0, |t| t.span.end)
    }

    // ==================== Ids, spans, diagnostics ====================

    pub(crate) fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn finished_node_count(&self) -> u32 {
        self.next_id
    }

    pub(crate) fn error(&mut self, code: u32, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(
            DiagnosticCategory::Parse,
            code,
            span,
            message,
        ));
    }

    pub(crate) fn token_text(&self, token: Token) -> &'a str {
        token.span.slice(self.source)
    }
}

fn describe_token(token: Token, source: &str) -> String {
    match token.kind {
        SyntaxKind::EndOfFile => "end of file".to_string(),
        SyntaxKind::Newline => "end of line".to_string(),
        _ => token.text(source).to_string(),
    }
}
