//! Expression and method-body parsing.
//!
//! Single pass, precedence climbing. Syntax the parser does not recognize
//! inside a body becomes an opaque [`ExprKind::Raw`] node carrying the
//! source text, so the emitter can pass it through verbatim and the solver
//! can give it `any`.

use super::ParserState;
use crate::ir::{
    BinOp, Block, BlockArg, Expr, ExprKind, InterpolationPart, LiteralValue, Param, ParamKind,
    ScopeKind, UnOp,
};
use trb_common::Span;
use trb_scanner::SyntaxKind;

impl<'a> ParserState<'a> {
    // ==================== Statements ====================

    /// Parse statements until one of `terminators` (or end of file).
    pub(crate) fn parse_block(&mut self, terminators: &[SyntaxKind]) -> Block {
        let start = self.current().span.start;
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            if terminators.contains(&self.kind()) || self.at_eof() {
                break;
            }
            let before = self.current();
            statements.push(self.parse_statement());
            // Safety: never loop without consuming.
            if self.current() == before && !self.at_eof() {
                self.bump();
            }
        }
        let span = match statements.first() {
            Some(first) => Span::new(first.span.start, self.previous_end()),
            None => Span::at(start),
        };
        Block::new(statements, span)
    }

    pub(crate) fn parse_statement(&mut self) -> Expr {
        let statement = match self.kind() {
            SyntaxKind::ReturnKeyword => {
                let kw = self.bump();
                let value = if self.at_statement_value_end() {
                    None
                } else {
                    Some(Box::new(self.parse_expression()))
                };
                Expr::new(
                    self.fresh_id(),
                    Span::new(kw.span.start, self.previous_end()),
                    ExprKind::Return { value },
                )
            }
            SyntaxKind::RaiseKeyword => self.parse_raise(),
            SyntaxKind::IfKeyword | SyntaxKind::UnlessKeyword => self.parse_if_expr(),
            SyntaxKind::WhileKeyword | SyntaxKind::UntilKeyword => self.parse_while_expr(),
            SyntaxKind::CaseKeyword => self.parse_case_expr(),
            SyntaxKind::Identifier
                if self.nth_kind(1) == SyntaxKind::ColonToken && self.nth_is_type_start(2) =>
            {
                self.parse_typed_local_assignment()
            }
            _ => self.parse_expression(),
        };
        self.attach_modifier(statement)
    }

    /// `stmt if cond` / `stmt unless cond` postfix modifiers.
    fn attach_modifier(&mut self, statement: Expr) -> Expr {
        let negated = match self.kind() {
            SyntaxKind::IfKeyword => false,
            SyntaxKind::UnlessKeyword => true,
            _ => return statement,
        };
        self.bump();
        let condition = self.parse_expression();
        let span = Span::new(statement.span.start, self.previous_end());
        let then_span = statement.span;
        Expr::new(
            self.fresh_id(),
            span,
            ExprKind::If {
                condition: Box::new(condition),
                then_branch: Block::new(vec![statement], then_span),
                else_branch: None,
                negated,
            },
        )
    }

    /// `x: T = value` - local assignment with a declared type.
    fn parse_typed_local_assignment(&mut self) -> Expr {
        let name_token = self.bump();
        let name = self.token_text(name_token).to_string();
        let target = Expr::new(
            self.fresh_id(),
            name_token.span,
            ExprKind::VariableRef {
                name,
                scope: ScopeKind::Local,
            },
        );
        let colon = self.bump();
        let declared_type = self.parse_type();
        let annotation_span = declared_type
            .as_ref()
            .map(|_| Span::new(colon.span.start, self.previous_end()));
        self.expect(SyntaxKind::EqualsToken, "`=`");
        let value = self.parse_expression();
        let span = Span::new(name_token.span.start, self.previous_end());
        Expr::new(
            self.fresh_id(),
            span,
            ExprKind::Assignment {
                target: Box::new(target),
                value: Box::new(value),
                declared_type,
                annotation_span,
            },
        )
    }

    fn parse_raise(&mut self) -> Expr {
        let kw = self.bump();
        let mut value = None;
        if !self.at_statement_value_end() {
            let exception = self.parse_expression();
            // `raise Klass, "message"` builds the exception from both parts.
            value = Some(if self.eat(SyntaxKind::CommaToken).is_some() {
                let message = self.parse_expression();
                let span = Span::new(exception.span.start, self.previous_end());
                Box::new(Expr::new(
                    self.fresh_id(),
                    span,
                    ExprKind::MethodCall {
                        receiver: Some(Box::new(exception)),
                        method: "new".to_string(),
                        args: vec![message],
                        kwargs: Vec::new(),
                        block: None,
                    },
                ))
            } else {
                Box::new(exception)
            });
        }
        Expr::new(
            self.fresh_id(),
            Span::new(kw.span.start, self.previous_end()),
            ExprKind::Raise { value },
        )
    }

    /// Whether `return`/`raise` stands without a value here.
    fn at_statement_value_end(&self) -> bool {
        self.at_line_end()
            || matches!(
                self.kind(),
                SyntaxKind::IfKeyword | SyntaxKind::UnlessKeyword | SyntaxKind::EndKeyword
            )
    }

    // ==================== Compound statements ====================

    /// `if`/`unless` with `elsif` chains, lowered to nested `If` nodes.
    fn parse_if_expr(&mut self) -> Expr {
        let kw = self.bump();
        let negated = kw.kind == SyntaxKind::UnlessKeyword;
        let mut expr = self.parse_if_tail(kw.span.start, negated);
        self.expect(SyntaxKind::EndKeyword, "`end`");
        expr.span = Span::new(kw.span.start, self.previous_end());
        expr
    }

    fn parse_if_tail(&mut self, start: u32, negated: bool) -> Expr {
        let condition = self.parse_expression();
        self.eat(SyntaxKind::ThenKeyword);
        let then_branch = self.parse_block(&[
            SyntaxKind::ElsifKeyword,
            SyntaxKind::ElseKeyword,
            SyntaxKind::EndKeyword,
        ]);
        let else_branch = if self.at(SyntaxKind::ElsifKeyword) {
            let elsif_kw = self.bump();
            let nested = self.parse_if_tail(elsif_kw.span.start, false);
            let nested_span = nested.span;
            Some(Block::new(vec![nested], nested_span))
        } else if self.eat(SyntaxKind::ElseKeyword).is_some() {
            Some(self.parse_block(&[SyntaxKind::EndKeyword]))
        } else {
            None
        };
        Expr::new(
            self.fresh_id(),
            Span::new(start, self.previous_end()),
            ExprKind::If {
                condition: Box::new(condition),
                then_branch,
                else_branch,
                negated,
            },
        )
    }

    fn parse_while_expr(&mut self) -> Expr {
        let kw = self.bump();
        let negated = kw.kind == SyntaxKind::UntilKeyword;
        let condition = self.parse_expression();
        self.eat(SyntaxKind::DoKeyword);
        let body = self.parse_block(&[SyntaxKind::EndKeyword]);
        self.expect(SyntaxKind::EndKeyword, "`end`");
        Expr::new(
            self.fresh_id(),
            Span::new(kw.span.start, self.previous_end()),
            ExprKind::While {
                condition: Box::new(condition),
                body,
                negated,
            },
        )
    }

    fn parse_case_expr(&mut self) -> Expr {
        let kw = self.bump();
        let scrutinee = if self.at_line_end() {
            None
        } else {
            Some(Box::new(self.parse_expression()))
        };
        let mut arms = Vec::new();
        let mut else_branch = None;
        loop {
            self.skip_separators();
            match self.kind() {
                SyntaxKind::WhenKeyword => {
                    self.bump();
                    let mut patterns = vec![self.parse_expression()];
                    while self.eat(SyntaxKind::CommaToken).is_some() {
                        patterns.push(self.parse_expression());
                    }
                    self.eat(SyntaxKind::ThenKeyword);
                    let body = self.parse_block(&[
                        SyntaxKind::WhenKeyword,
                        SyntaxKind::ElseKeyword,
                        SyntaxKind::EndKeyword,
                    ]);
                    arms.push((patterns, body));
                }
                SyntaxKind::ElseKeyword => {
                    self.bump();
                    else_branch = Some(self.parse_block(&[SyntaxKind::EndKeyword]));
                }
                _ => break,
            }
        }
        self.expect(SyntaxKind::EndKeyword, "`end`");
        Expr::new(
            self.fresh_id(),
            Span::new(kw.span.start, self.previous_end()),
            ExprKind::Case {
                scrutinee,
                arms,
                else_branch,
            },
        )
    }

    // ==================== Expressions ====================

    pub(crate) fn parse_expression(&mut self) -> Expr {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Expr {
        let lhs = self.parse_ternary();
        let compound = match self.kind() {
            SyntaxKind::EqualsToken => None,
            SyntaxKind::PlusEqualsToken => Some(BinOp::Add),
            SyntaxKind::MinusEqualsToken => Some(BinOp::Sub),
            SyntaxKind::StarEqualsToken => Some(BinOp::Mul),
            SyntaxKind::SlashEqualsToken => Some(BinOp::Div),
            SyntaxKind::PercentEqualsToken => Some(BinOp::Mod),
            SyntaxKind::BarBarEqualsToken => Some(BinOp::Or),
            SyntaxKind::AmpersandAmpersandEqualsToken => Some(BinOp::And),
            _ => return lhs,
        };
        if !is_assignable(&lhs) {
            return lhs;
        }
        self.bump();
        let rhs = self.parse_assignment();
        // `x += e` desugars to `x = x + e`.
        let value = match compound {
            Some(op) => {
                let operand = Expr::new(self.fresh_id(), lhs.span, lhs.kind.clone());
                let value_span = Span::new(lhs.span.start, rhs.span.end);
                Expr::new(
                    self.fresh_id(),
                    value_span,
                    ExprKind::Binary {
                        op,
                        left: Box::new(operand),
                        right: Box::new(rhs),
                    },
                )
            }
            None => rhs,
        };
        let span = Span::new(lhs.span.start, self.previous_end());
        Expr::new(
            self.fresh_id(),
            span,
            ExprKind::Assignment {
                target: Box::new(lhs),
                value: Box::new(value),
                declared_type: None,
                annotation_span: None,
            },
        )
    }

    fn parse_ternary(&mut self) -> Expr {
        let condition = self.parse_range();
        if !self.at(SyntaxKind::QuestionToken) {
            return condition;
        }
        self.bump();
        let then_expr = self.parse_ternary();
        self.expect(SyntaxKind::ColonToken, "`:` in ternary expression");
        let else_expr = self.parse_ternary();
        let span = Span::new(condition.span.start, self.previous_end());
        let then_span = then_expr.span;
        let else_span = else_expr.span;
        Expr::new(
            self.fresh_id(),
            span,
            ExprKind::If {
                condition: Box::new(condition),
                then_branch: Block::new(vec![then_expr], then_span),
                else_branch: Some(Block::new(vec![else_expr], else_span)),
                negated: false,
            },
        )
    }

    fn parse_range(&mut self) -> Expr {
        let mut left = self.parse_or();
        loop {
            let op = match self.kind() {
                SyntaxKind::DotDotToken => BinOp::Range,
                SyntaxKind::DotDotDotToken => BinOp::RangeExclusive,
                _ => break,
            };
            self.bump();
            let right = self.parse_or();
            left = self.binary(op, left, right);
        }
        left
    }

    fn parse_or(&mut self) -> Expr {
        let mut left = self.parse_and();
        while matches!(self.kind(), SyntaxKind::BarBarToken | SyntaxKind::OrKeyword) {
            self.bump();
            let right = self.parse_and();
            left = self.binary(BinOp::Or, left, right);
        }
        left
    }

    fn parse_and(&mut self) -> Expr {
        let mut left = self.parse_equality();
        while matches!(
            self.kind(),
            SyntaxKind::AmpersandAmpersandToken | SyntaxKind::AndKeyword
        ) {
            self.bump();
            let right = self.parse_equality();
            left = self.binary(BinOp::And, left, right);
        }
        left
    }

    fn parse_equality(&mut self) -> Expr {
        let mut left = self.parse_comparison();
        loop {
            let op = match self.kind() {
                SyntaxKind::EqualsEqualsToken => BinOp::Eq,
                SyntaxKind::BangEqualsToken => BinOp::NotEq,
                SyntaxKind::SpaceshipToken => BinOp::Spaceship,
                _ => break,
            };
            self.bump();
            let right = self.parse_comparison();
            left = self.binary(op, left, right);
        }
        left
    }

    fn parse_comparison(&mut self) -> Expr {
        let mut left = self.parse_bitor();
        loop {
            let op = match self.kind() {
                SyntaxKind::LessThanToken => BinOp::Lt,
                SyntaxKind::LessThanEqualsToken => BinOp::LtEq,
                SyntaxKind::GreaterThanToken => BinOp::Gt,
                SyntaxKind::GreaterThanEqualsToken => BinOp::GtEq,
                _ => break,
            };
            self.bump();
            let right = self.parse_bitor();
            left = self.binary(op, left, right);
        }
        left
    }

    fn parse_bitor(&mut self) -> Expr {
        let mut left = self.parse_bitand();
        loop {
            let op = match self.kind() {
                SyntaxKind::BarToken => BinOp::BitOr,
                SyntaxKind::CaretToken => BinOp::BitXor,
                _ => break,
            };
            self.bump();
            let right = self.parse_bitand();
            left = self.binary(op, left, right);
        }
        left
    }

    fn parse_bitand(&mut self) -> Expr {
        let mut left = self.parse_shift();
        while self.at(SyntaxKind::AmpersandToken) {
            self.bump();
            let right = self.parse_shift();
            left = self.binary(BinOp::BitAnd, left, right);
        }
        left
    }

    fn parse_shift(&mut self) -> Expr {
        let mut left = self.parse_additive();
        loop {
            let op = match self.kind() {
                SyntaxKind::LessThanLessThanToken => BinOp::Shl,
                SyntaxKind::GreaterThanGreaterThanToken => BinOp::Shr,
                _ => break,
            };
            self.bump();
            let right = self.parse_additive();
            left = self.binary(op, left, right);
        }
        left
    }

    fn parse_additive(&mut self) -> Expr {
        let mut left = self.parse_multiplicative();
        loop {
            let op = match self.kind() {
                SyntaxKind::PlusToken => BinOp::Add,
                SyntaxKind::MinusToken => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let right = self.parse_multiplicative();
            left = self.binary(op, left, right);
        }
        left
    }

    fn parse_multiplicative(&mut self) -> Expr {
        let mut left = self.parse_unary();
        loop {
            let op = match self.kind() {
                SyntaxKind::StarToken => BinOp::Mul,
                SyntaxKind::SlashToken => BinOp::Div,
                SyntaxKind::PercentToken => BinOp::Mod,
                _ => break,
            };
            self.bump();
            let right = self.parse_unary();
            left = self.binary(op, left, right);
        }
        left
    }

    fn parse_unary(&mut self) -> Expr {
        let op = match self.kind() {
            SyntaxKind::MinusToken => UnOp::Neg,
            SyntaxKind::BangToken | SyntaxKind::NotKeyword => UnOp::Not,
            _ => return self.parse_power(),
        };
        let token = self.bump();
        let operand = self.parse_unary();
        let span = Span::new(token.span.start, operand.span.end);
        Expr::new(
            self.fresh_id(),
            span,
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
        )
    }

    fn parse_power(&mut self) -> Expr {
        let base = self.parse_postfix();
        if !self.at(SyntaxKind::StarStarToken) {
            return base;
        }
        self.bump();
        // Right-associative; `**` binds tighter than unary minus.
        let exponent = self.parse_unary();
        self.binary(BinOp::Pow, base, exponent)
    }

    fn binary(&mut self, op: BinOp, left: Expr, right: Expr) -> Expr {
        let span = Span::new(left.span.start, right.span.end);
        Expr::new(
            self.fresh_id(),
            span,
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        )
    }

    // ==================== Postfix ====================

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            match self.kind() {
                SyntaxKind::DotToken
                    if matches!(
                        self.nth_kind(1),
                        SyntaxKind::Identifier | SyntaxKind::ClassKeyword
                    ) =>
                {
                    self.bump();
                    let name_token = self.bump();
                    let method = self.token_text(name_token).to_string();
                    let (args, kwargs) = if self.at(SyntaxKind::LeftParenToken) {
                        self.parse_call_args()
                    } else {
                        (Vec::new(), Vec::new())
                    };
                    let block = self.parse_block_arg();
                    let span = Span::new(expr.span.start, self.previous_end());
                    expr = Expr::new(
                        self.fresh_id(),
                        span,
                        ExprKind::MethodCall {
                            receiver: Some(Box::new(expr)),
                            method,
                            args,
                            kwargs,
                            block,
                        },
                    );
                }
                SyntaxKind::SafeNavigationToken
                    if self.nth_kind(1) == SyntaxKind::Identifier =>
                {
                    self.bump();
                    let name_token = self.bump();
                    let method = self.token_text(name_token).to_string();
                    let (args, _) = if self.at(SyntaxKind::LeftParenToken) {
                        self.parse_call_args()
                    } else {
                        (Vec::new(), Vec::new())
                    };
                    let span = Span::new(expr.span.start, self.previous_end());
                    expr = Expr::new(
                        self.fresh_id(),
                        span,
                        ExprKind::SafeNavigation {
                            receiver: Box::new(expr),
                            method,
                            args,
                        },
                    );
                }
                SyntaxKind::LeftBracketToken => {
                    self.bump();
                    let mut args = Vec::new();
                    if !self.at(SyntaxKind::RightBracketToken) {
                        loop {
                            args.push(self.parse_expression());
                            if self.eat(SyntaxKind::CommaToken).is_none() {
                                break;
                            }
                        }
                    }
                    self.expect(SyntaxKind::RightBracketToken, "`]`");
                    let span = Span::new(expr.span.start, self.previous_end());
                    expr = Expr::new(
                        self.fresh_id(),
                        span,
                        ExprKind::Index {
                            receiver: Box::new(expr),
                            args,
                        },
                    );
                }
                SyntaxKind::Identifier
                    if self.token_text(self.current()) == "as" && self.nth_is_type_start(1) =>
                {
                    self.bump();
                    if let Some(target) = self.parse_type() {
                        let span = Span::new(expr.span.start, self.previous_end());
                        expr = Expr::new(
                            self.fresh_id(),
                            span,
                            ExprKind::TypeAssertion {
                                expr: Box::new(expr),
                                target,
                            },
                        );
                    }
                }
                _ => break,
            }
        }
        expr
    }

    // ==================== Primary ====================

    fn parse_primary(&mut self) -> Expr {
        let token = self.current();
        match token.kind {
            SyntaxKind::IntegerLiteral => {
                self.bump();
                let value = self.token_text(token).replace('_', "").parse().unwrap_or(0);
                self.literal(token.span, LiteralValue::Int(value))
            }
            SyntaxKind::FloatLiteral => {
                self.bump();
                let value = self
                    .token_text(token)
                    .replace('_', "")
                    .parse()
                    .unwrap_or(0.0);
                self.literal(token.span, LiteralValue::Float(value))
            }
            SyntaxKind::StringLiteral => {
                self.bump();
                let text = self.token_text(token);
                self.literal(token.span, LiteralValue::Str(unquote(text)))
            }
            SyntaxKind::StringFragment => self.parse_interpolation(),
            SyntaxKind::SymbolLiteral => {
                self.bump();
                let name = self.token_text(token).trim_start_matches(':').to_string();
                self.literal(token.span, LiteralValue::Symbol(name))
            }
            SyntaxKind::TrueKeyword => {
                self.bump();
                self.literal(token.span, LiteralValue::Bool(true))
            }
            SyntaxKind::FalseKeyword => {
                self.bump();
                self.literal(token.span, LiteralValue::Bool(false))
            }
            SyntaxKind::NilKeyword => {
                self.bump();
                self.literal(token.span, LiteralValue::Nil)
            }
            SyntaxKind::SelfKeyword => {
                self.bump();
                Expr::new(
                    self.fresh_id(),
                    token.span,
                    ExprKind::VariableRef {
                        name: "self".to_string(),
                        scope: ScopeKind::Local,
                    },
                )
            }
            SyntaxKind::InstanceVariable => {
                self.bump();
                let name = self.token_text(token).trim_start_matches('@').to_string();
                Expr::new(
                    self.fresh_id(),
                    token.span,
                    ExprKind::VariableRef {
                        name,
                        scope: ScopeKind::Instance,
                    },
                )
            }
            SyntaxKind::ClassVariable => {
                self.bump();
                let name = self.token_text(token).trim_start_matches('@').to_string();
                Expr::new(
                    self.fresh_id(),
                    token.span,
                    ExprKind::VariableRef {
                        name,
                        scope: ScopeKind::Class,
                    },
                )
            }
            SyntaxKind::GlobalVariable => {
                self.bump();
                let name = self.token_text(token).trim_start_matches('$').to_string();
                Expr::new(
                    self.fresh_id(),
                    token.span,
                    ExprKind::VariableRef {
                        name,
                        scope: ScopeKind::Global,
                    },
                )
            }
            SyntaxKind::ConstantName => {
                self.bump();
                let mut name = self.token_text(token).to_string();
                while self.at(SyntaxKind::ColonColonToken)
                    && self.nth_kind(1) == SyntaxKind::ConstantName
                {
                    self.bump();
                    let part = self.bump();
                    name.push_str("::");
                    name.push_str(self.token_text(part));
                }
                Expr::new(
                    self.fresh_id(),
                    Span::new(token.span.start, self.previous_end()),
                    ExprKind::VariableRef {
                        name,
                        scope: ScopeKind::Constant,
                    },
                )
            }
            SyntaxKind::Identifier => self.parse_identifier_expression(),
            SyntaxKind::LeftParenToken => {
                self.bump();
                let inner = self.parse_expression();
                self.expect(SyntaxKind::RightParenToken, "`)`");
                inner
            }
            SyntaxKind::LeftBracketToken => self.parse_array_literal(),
            SyntaxKind::LeftBraceToken => self.parse_hash_literal(),
            SyntaxKind::ArrowToken => self.parse_lambda(),
            SyntaxKind::IfKeyword | SyntaxKind::UnlessKeyword => self.parse_if_expr(),
            SyntaxKind::CaseKeyword => self.parse_case_expr(),
            SyntaxKind::WhileKeyword | SyntaxKind::UntilKeyword => self.parse_while_expr(),
            _ => self.parse_raw_fallback(),
        }
    }

    /// A bare identifier: local variable reference, or a receiverless
    /// method call (parenthesized, unparenthesized or block-taking).
    fn parse_identifier_expression(&mut self) -> Expr {
        let token = self.bump();
        let name = self.token_text(token).to_string();

        if self.at(SyntaxKind::LeftParenToken) {
            let (args, kwargs) = self.parse_call_args();
            let block = self.parse_block_arg();
            let span = Span::new(token.span.start, self.previous_end());
            return Expr::new(
                self.fresh_id(),
                span,
                ExprKind::MethodCall {
                    receiver: None,
                    method: name,
                    args,
                    kwargs,
                    block,
                },
            );
        }

        // `items.each do ... end` attaches at postfix; a bare
        // `loop do ... end` attaches here.
        if matches!(self.kind(), SyntaxKind::DoKeyword | SyntaxKind::LeftBraceToken) {
            let block = self.parse_block_arg();
            let span = Span::new(token.span.start, self.previous_end());
            return Expr::new(
                self.fresh_id(),
                span,
                ExprKind::MethodCall {
                    receiver: None,
                    method: name,
                    args: Vec::new(),
                    kwargs: Vec::new(),
                    block,
                },
            );
        }

        // Unparenthesized call arguments (`puts "hello"`).
        if self.at_unparenthesized_arg() {
            let mut args = vec![self.parse_ternary()];
            while self.eat(SyntaxKind::CommaToken).is_some() {
                args.push(self.parse_ternary());
            }
            let span = Span::new(token.span.start, self.previous_end());
            return Expr::new(
                self.fresh_id(),
                span,
                ExprKind::MethodCall {
                    receiver: None,
                    method: name,
                    args,
                    kwargs: Vec::new(),
                    block: None,
                },
            );
        }

        Expr::new(
            self.fresh_id(),
            token.span,
            ExprKind::VariableRef {
                name,
                scope: ScopeKind::Local,
            },
        )
    }

    /// Whether the current token clearly starts an argument of an
    /// unparenthesized call.
    fn at_unparenthesized_arg(&self) -> bool {
        match self.kind() {
            SyntaxKind::IntegerLiteral
            | SyntaxKind::FloatLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::StringFragment
            | SyntaxKind::SymbolLiteral
            | SyntaxKind::InstanceVariable
            | SyntaxKind::ClassVariable
            | SyntaxKind::GlobalVariable
            | SyntaxKind::ConstantName
            | SyntaxKind::TrueKeyword
            | SyntaxKind::FalseKeyword
            | SyntaxKind::NilKeyword
            | SyntaxKind::SelfKeyword => true,
            SyntaxKind::Identifier => self.token_text(self.current()) != "as",
            _ => false,
        }
    }

    fn parse_call_args(&mut self) -> (Vec<Expr>, Vec<(String, Expr)>) {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        self.bump(); // `(`
        self.skip_separators();
        if self.eat(SyntaxKind::RightParenToken).is_some() {
            return (args, kwargs);
        }
        loop {
            if self.at(SyntaxKind::Identifier) && self.nth_kind(1) == SyntaxKind::ColonToken {
                let name_token = self.bump();
                self.bump(); // `:`
                let value = self.parse_expression();
                kwargs.push((self.token_text(name_token).to_string(), value));
            } else {
                args.push(self.parse_expression());
            }
            self.skip_separators();
            if self.eat(SyntaxKind::CommaToken).is_none() {
                break;
            }
            self.skip_separators();
        }
        self.expect(SyntaxKind::RightParenToken, "`)`");
        (args, kwargs)
    }

    /// `{ |x| ... }` or `do |x| ... end` attached to a call.
    fn parse_block_arg(&mut self) -> Option<Box<BlockArg>> {
        match self.kind() {
            SyntaxKind::LeftBraceToken => {
                let open = self.bump();
                let params = self.parse_block_params();
                let body = self.parse_block(&[SyntaxKind::RightBraceToken]);
                self.expect(SyntaxKind::RightBraceToken, "`}`");
                Some(Box::new(BlockArg {
                    params,
                    body,
                    span: Span::new(open.span.start, self.previous_end()),
                }))
            }
            SyntaxKind::DoKeyword => {
                let open = self.bump();
                let params = self.parse_block_params();
                let body = self.parse_block(&[SyntaxKind::EndKeyword]);
                self.expect(SyntaxKind::EndKeyword, "`end`");
                Some(Box::new(BlockArg {
                    params,
                    body,
                    span: Span::new(open.span.start, self.previous_end()),
                }))
            }
            _ => None,
        }
    }

    /// `|a, b|` block parameters (always untyped).
    fn parse_block_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if self.eat(SyntaxKind::BarToken).is_none() {
            return params;
        }
        while let Some(name_token) = self.eat(SyntaxKind::Identifier) {
            params.push(Param {
                name: self.token_text(name_token).to_string(),
                kind: ParamKind::Positional,
                ty: None,
                annotation_span: None,
                default: None,
                span: name_token.span,
            });
            if self.eat(SyntaxKind::CommaToken).is_none() {
                break;
            }
        }
        self.expect(SyntaxKind::BarToken, "`|`");
        params
    }

    fn parse_array_literal(&mut self) -> Expr {
        let open = self.bump();
        let mut elements = Vec::new();
        self.skip_separators();
        if !self.at(SyntaxKind::RightBracketToken) {
            loop {
                elements.push(self.parse_expression());
                self.skip_separators();
                if self.eat(SyntaxKind::CommaToken).is_none() {
                    break;
                }
                self.skip_separators();
            }
        }
        self.expect(SyntaxKind::RightBracketToken, "`]`");
        Expr::new(
            self.fresh_id(),
            Span::new(open.span.start, self.previous_end()),
            ExprKind::ArrayLiteral(elements),
        )
    }

    fn parse_hash_literal(&mut self) -> Expr {
        let open = self.bump();
        let mut entries = Vec::new();
        self.skip_separators();
        if !self.at(SyntaxKind::RightBraceToken) {
            loop {
                // `key: value` symbol-key sugar, or `expr => expr`.
                if self.at(SyntaxKind::Identifier) && self.nth_kind(1) == SyntaxKind::ColonToken {
                    let key_token = self.bump();
                    self.bump();
                    let key = self.literal(
                        key_token.span,
                        LiteralValue::Symbol(self.token_text(key_token).to_string()),
                    );
                    let value = self.parse_expression();
                    entries.push((key, value));
                } else {
                    let key = self.parse_expression();
                    self.expect(SyntaxKind::FatArrowToken, "`=>` in hash literal");
                    let value = self.parse_expression();
                    entries.push((key, value));
                }
                self.skip_separators();
                if self.eat(SyntaxKind::CommaToken).is_none() {
                    break;
                }
                self.skip_separators();
            }
        }
        self.expect(SyntaxKind::RightBraceToken, "`}`");
        Expr::new(
            self.fresh_id(),
            Span::new(open.span.start, self.previous_end()),
            ExprKind::HashLiteral(entries),
        )
    }

    /// `-> (x: T) { ... }` lambda literals.
    fn parse_lambda(&mut self) -> Expr {
        let arrow = self.bump();
        let params = if self.at(SyntaxKind::LeftParenToken) {
            self.parse_params()
        } else {
            Vec::new()
        };
        let body = match self.kind() {
            SyntaxKind::LeftBraceToken => {
                self.bump();
                let body = self.parse_block(&[SyntaxKind::RightBraceToken]);
                self.expect(SyntaxKind::RightBraceToken, "`}`");
                body
            }
            SyntaxKind::DoKeyword => {
                self.bump();
                let body = self.parse_block(&[SyntaxKind::EndKeyword]);
                self.expect(SyntaxKind::EndKeyword, "`end`");
                body
            }
            _ => {
                let current = self.current();
                self.error(
                    trb_common::diagnostics::codes::UNEXPECTED_TOKEN,
                    current.span,
                    "expected `{` or `do` to open lambda body",
                );
                Block::default()
            }
        };
        Expr::new(
            self.fresh_id(),
            Span::new(arrow.span.start, self.previous_end()),
            ExprKind::Lambda { params, body },
        )
    }

    fn parse_interpolation(&mut self) -> Expr {
        let first = self.current();
        let start = first.span.start;
        let mut parts = Vec::new();
        let mut is_first = true;
        loop {
            match self.kind() {
                SyntaxKind::StringFragment => {
                    let token = self.bump();
                    // A fragment is non-closing exactly when `#{` follows.
                    let closes = !self.at(SyntaxKind::InterpolationStart);
                    let mut text = self.token_text(token);
                    if is_first {
                        text = text.strip_prefix('"').unwrap_or(text);
                    }
                    if closes {
                        text = text.strip_suffix('"').unwrap_or(text);
                    }
                    if !text.is_empty() {
                        parts.push(InterpolationPart::Str(unescape(text)));
                    }
                    is_first = false;
                    if closes {
                        break;
                    }
                }
                SyntaxKind::InterpolationStart => {
                    self.bump();
                    parts.push(InterpolationPart::Expr(self.parse_expression()));
                    self.expect(SyntaxKind::InterpolationEnd, "`}`");
                }
                _ => break,
            }
        }
        Expr::new(
            self.fresh_id(),
            Span::new(start, self.previous_end()),
            ExprKind::Interpolation(parts),
        )
    }

    /// Unknown syntax: consume to the end of the line and keep the text.
    fn parse_raw_fallback(&mut self) -> Expr {
        let start = self.current().span.start;
        while !self.at_line_end()
            && !matches!(
                self.kind(),
                SyntaxKind::EndKeyword
                    | SyntaxKind::RightParenToken
                    | SyntaxKind::RightBraceToken
                    | SyntaxKind::RightBracketToken
            )
        {
            self.bump();
        }
        let span = Span::new(start, self.previous_end().max(start));
        let text = span.slice(self.source).to_string();
        Expr::new(self.fresh_id(), span, ExprKind::Raw { text })
    }

    fn literal(&mut self, span: Span, value: LiteralValue) -> Expr {
        Expr::new(self.fresh_id(), span, ExprKind::Literal(value))
    }
}

/// Whether an expression may appear as an assignment target.
fn is_assignable(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::VariableRef { .. } | ExprKind::Index { .. } => true,
        // `receiver.attr = value` attribute writers.
        ExprKind::MethodCall {
            receiver: Some(_),
            args,
            kwargs,
            block: None,
            ..
        } => args.is_empty() && kwargs.is_empty(),
        _ => false,
    }
}

/// Strip the delimiting quotes and process escapes.
fn unquote(raw: &str) -> String {
    let inner = raw
        .strip_prefix(['"', '\''])
        .and_then(|t| t.strip_suffix(['"', '\'']))
        .unwrap_or(raw);
    unescape(inner)
}

/// Process the common escape sequences; unknown escapes keep the character.
fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some('s') => result.push(' '),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}
