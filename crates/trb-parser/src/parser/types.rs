//! Type-expression parsing.
//!
//! Precedence, lowest to highest: union `|`, intersection `&`, optional
//! suffix `?`, generic application `<...>`, atoms. Intersection binds
//! tighter than union, so `A & B | C` parses as `(A & B) | C`; a trailing
//! `?` binds to the immediately preceding atom, so `A | B?` is
//! `A | (B | nil)`.

use super::ParserState;
use crate::ir::types::{
    TypeExpr, TypeLit, canonical_type_name, intersection_of, optional_of, union_of,
};
use trb_common::Span;
use trb_common::diagnostics::codes;
use trb_scanner::SyntaxKind;

impl<'a> ParserState<'a> {
    /// Parse a type expression. Names bound by an enclosing declaration's
    /// generic-parameter list (`ParserState::type_vars`) become
    /// [`TypeExpr::TypeVar`] references.
    ///
    /// On malformed input a diagnostic is recorded and `None` returned.
    pub(crate) fn parse_type(&mut self) -> Option<TypeExpr> {
        self.parse_union_type()
    }

    fn parse_union_type(&mut self) -> Option<TypeExpr> {
        let start = self.current().span.start;
        let first = self.parse_intersection_type()?;
        if !self.at(SyntaxKind::BarToken) {
            return Some(first);
        }
        let mut members = vec![first];
        while self.eat(SyntaxKind::BarToken).is_some() {
            members.push(self.parse_intersection_type()?);
        }
        let span = Span::new(start, self.previous_end());
        Some(union_of(members, span))
    }

    fn parse_intersection_type(&mut self) -> Option<TypeExpr> {
        let start = self.current().span.start;
        let first = self.parse_optional_type()?;
        if !self.at(SyntaxKind::AmpersandToken) {
            return Some(first);
        }
        let mut members = vec![first];
        while self.eat(SyntaxKind::AmpersandToken).is_some() {
            members.push(self.parse_optional_type()?);
        }
        let span = Span::new(start, self.previous_end());
        Some(intersection_of(members, span))
    }

    fn parse_optional_type(&mut self) -> Option<TypeExpr> {
        let start = self.current().span.start;
        let mut ty = self.parse_atomic_type()?;
        while self.eat(SyntaxKind::QuestionToken).is_some() {
            ty = optional_of(ty, Span::new(start, self.previous_end()));
        }
        Some(ty)
    }

    fn parse_atomic_type(&mut self) -> Option<TypeExpr> {
        let token = self.current();
        match token.kind {
            SyntaxKind::ConstantName | SyntaxKind::Identifier => self.parse_named_type(),
            SyntaxKind::NilKeyword => {
                self.bump();
                Some(TypeExpr::nil(token.span))
            }
            SyntaxKind::SelfKeyword => {
                self.bump();
                Some(TypeExpr::SelfType { span: token.span })
            }
            SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword => {
                self.bump();
                Some(TypeExpr::Literal {
                    value: TypeLit::Bool(token.kind == SyntaxKind::TrueKeyword),
                    span: token.span,
                })
            }
            SyntaxKind::StringLiteral => {
                self.bump();
                let text = self.token_text(token);
                let inner = text
                    .strip_prefix(['"', '\''])
                    .and_then(|t| t.strip_suffix(['"', '\'']))
                    .unwrap_or(text);
                Some(TypeExpr::Literal {
                    value: TypeLit::Str(inner.to_string()),
                    span: token.span,
                })
            }
            SyntaxKind::IntegerLiteral => {
                self.bump();
                let value = self.token_text(token).replace('_', "").parse().unwrap_or(0);
                Some(TypeExpr::Literal {
                    value: TypeLit::Int(value),
                    span: token.span,
                })
            }
            SyntaxKind::SymbolLiteral => {
                self.bump();
                let name = self.token_text(token).trim_start_matches(':').to_string();
                Some(TypeExpr::Literal {
                    value: TypeLit::Symbol(name),
                    span: token.span,
                })
            }
            SyntaxKind::LeftParenToken => self.parse_paren_or_function_type(),
            SyntaxKind::LeftBracketToken => self.parse_tuple_type(),
            _ => {
                self.error(
                    codes::EXPECTED_TYPE,
                    token.span,
                    format!(
                        "expected a type, found `{}`",
                        token.span.slice(self.source)
                    ),
                );
                None
            }
        }
    }

    /// `Name`, `Outer::Inner`, `Name<Args>`, or a generic-parameter
    /// reference when the name is bound by an enclosing declaration.
    fn parse_named_type(&mut self) -> Option<TypeExpr> {
        let first = self.bump();
        let start = first.span.start;
        let mut name = self.token_text(first).to_string();
        while self.at(SyntaxKind::ColonColonToken)
            && self.nth_kind(1) == SyntaxKind::ConstantName
        {
            self.bump();
            let part = self.bump();
            name.push_str("::");
            name.push_str(self.token_text(part));
        }

        if self.type_vars.iter().any(|v| v == &name) {
            return Some(TypeExpr::TypeVar {
                name,
                span: Span::new(start, self.previous_end()),
            });
        }

        let name = canonical_type_name(&name).to_string();
        let mut args = Vec::new();
        if self.at(SyntaxKind::LessThanToken) {
            let open = self.bump();
            if self.eat_type_list_close() {
                self.error(
                    codes::EMPTY_TYPE_ARGUMENTS,
                    Span::new(open.span.start, self.previous_end()),
                    "type argument list cannot be empty",
                );
            } else {
                loop {
                    args.push(self.parse_type()?);
                    if self.eat(SyntaxKind::CommaToken).is_none() {
                        break;
                    }
                }
                if !self.eat_type_list_close() {
                    let current = self.current();
                    self.error(
                        codes::UNEXPECTED_TOKEN,
                        current.span,
                        "expected `>` to close type argument list",
                    );
                    return None;
                }
            }
        }

        Some(TypeExpr::Named {
            name,
            args,
            span: Span::new(start, self.previous_end()),
        })
    }

    /// `(T)` grouping or `(T1, T2) -> R` function type.
    fn parse_paren_or_function_type(&mut self) -> Option<TypeExpr> {
        let open = self.bump();
        let mut params = Vec::new();
        if !self.at(SyntaxKind::RightParenToken) {
            loop {
                params.push(self.parse_type()?);
                if self.eat(SyntaxKind::CommaToken).is_none() {
                    break;
                }
            }
        }
        self.expect(SyntaxKind::RightParenToken, "`)`")?;

        if self.eat(SyntaxKind::ArrowToken).is_some() {
            let ret = self.parse_type()?;
            let span = Span::new(open.span.start, self.previous_end());
            return Some(TypeExpr::Function {
                params,
                ret: Box::new(ret),
                span,
            });
        }

        // Plain grouping: exactly one inner type.
        if params.len() == 1 {
            return params.into_iter().next();
        }
        let span = Span::new(open.span.start, self.previous_end());
        self.error(
            codes::EXPECTED_TYPE,
            span,
            "a parenthesized type group must contain exactly one type (did you mean a function type `(...) -> R`?)",
        );
        None
    }

    /// Tuple syntax `[T1, T2]` parses but is not yet supported.
    fn parse_tuple_type(&mut self) -> Option<TypeExpr> {
        let open = self.bump();
        if !self.at(SyntaxKind::RightBracketToken) {
            loop {
                self.parse_type()?;
                if self.eat(SyntaxKind::CommaToken).is_none() {
                    break;
                }
            }
        }
        self.expect(SyntaxKind::RightBracketToken, "`]`")?;
        let span = Span::new(open.span.start, self.previous_end());
        self.error(
            codes::TUPLE_TYPES_UNSUPPORTED,
            span,
            "tuple types are not yet supported",
        );
        None
    }

    /// Whether the token `n` positions ahead could begin a type expression,
    /// with one extra token of lookahead for literal types (a literal
    /// counts only when a `|` follows, so `status: :active` stays a
    /// default value rather than a literal type).
    pub(crate) fn nth_is_type_start(&self, n: usize) -> bool {
        match self.nth_kind(n) {
            SyntaxKind::ConstantName
            | SyntaxKind::NilKeyword
            | SyntaxKind::SelfKeyword
            | SyntaxKind::LeftParenToken
            | SyntaxKind::LeftBracketToken => true,
            SyntaxKind::Identifier => {
                // Lowercase builtin spellings (`untyped`, `bool`, `void`...).
                matches!(
                    self.nth_token(n).span.slice(self.source),
                    "untyped" | "bool" | "boolean" | "void" | "never" | "any"
                )
            }
            SyntaxKind::StringLiteral
            | SyntaxKind::IntegerLiteral
            | SyntaxKind::SymbolLiteral
            | SyntaxKind::TrueKeyword
            | SyntaxKind::FalseKeyword => self.nth_kind(n + 1) == SyntaxKind::BarToken,
            _ => false,
        }
    }
}
